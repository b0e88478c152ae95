use anyhow::{anyhow, bail, Result};
use chrono::{TimeDelta, Utc};
use futures_util::future::join_all;
use std::num::NonZeroU32;
use std::str::FromStr;
use std::sync::Arc;
use taskpool_core::{
    all_tasks, counts, has_more_anywhere, total_count, PoolStore, Priority, StatusChange, Tag,
    Task, TaskStatus,
};
use taskpool_sync::{HttpTaskService, Outcome, TaskSync};

use crate::config::Config;

/// Which pools a command looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    All,
    One(Tag),
}

impl Selection {
    pub fn tags(self) -> Vec<Tag> {
        match self {
            Selection::All => Tag::DISPLAY_ORDER.to_vec(),
            Selection::One(tag) => vec![tag],
        }
    }
}

impl FromStr for Selection {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(Selection::All);
        }
        Ok(Selection::One(s.parse()?))
    }
}

/// The engine plus the display settings the UI layer decides on.
pub struct App {
    pub sync: TaskSync,
    pub page_size: NonZeroU32,
    pub snooze_minutes: i64,
}

impl App {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let service = HttpTaskService::new(cfg.server.base_url.clone(), cfg.timeout())?;
        Ok(Self {
            sync: TaskSync::new(Arc::new(service), cfg.user_id()?),
            page_size: cfg.page_size()?,
            snooze_minutes: cfg.display.snooze_minutes,
        })
    }

    /// Make sure every selected pool has its first page.
    pub async fn activate(&self, sel: Selection) {
        let loader = self.sync.loader();
        join_all(sel.tags().into_iter().map(|tag| loader.ensure_loaded(tag, self.page_size))).await;
    }

    pub async fn more(&self, sel: Selection) {
        match sel {
            Selection::All => {
                self.sync.loader().load_more_all(self.page_size).await;
            }
            Selection::One(tag) => {
                self.sync.loader().load_more(tag, self.page_size).await;
            }
        }
    }

    pub fn snooze_change(&self, minutes: Option<i64>) -> Result<StatusChange> {
        snooze_for(minutes.unwrap_or(self.snooze_minutes))
    }

    /// Error slot as a command result.
    pub fn check(&self) -> Result<()> {
        match self.sync.state().error() {
            Some(failure) => Err(anyhow!("{failure} (last operation: {})", failure.operation)),
            None => Ok(()),
        }
    }
}

pub async fn list(app: &App, sel: Selection, pages: usize) -> Result<()> {
    if pages == 0 {
        bail!("--pages must be at least 1");
    }
    app.activate(sel).await;
    for _ in 1..pages {
        app.more(sel).await;
    }
    print!("{}", render(&app.sync.state().pools(), sel));
    app.check()
}

pub async fn set_status(app: &App, task_id: &str, change: StatusChange) -> Result<()> {
    let status = change.status;
    match app.sync.mutator().set_status(task_id, change).await {
        Outcome::Applied => {
            println!("{task_id} -> {status}");
            Ok(())
        }
        _ => app.check(),
    }
}

/// Snooze `minutes` from now. Rejects values that are not in the future or
/// that overflow the clock.
pub fn snooze_for(minutes: i64) -> Result<StatusChange> {
    if minutes < 1 {
        bail!("snooze minutes must be at least 1, got {minutes}");
    }
    let until = TimeDelta::try_minutes(minutes)
        .and_then(|delta| Utc::now().checked_add_signed(delta))
        .ok_or_else(|| anyhow!("snooze of {minutes} minutes is out of range"))?;
    Ok(StatusChange::snooze_until(until))
}

pub fn reopen_change() -> StatusChange {
    StatusChange::to(TaskStatus::Pending)
}

fn label(t: &Task) -> &'static str {
    match t.status {
        TaskStatus::Missed => "MISSED",
        _ => match t.priority {
            Priority::High => "HIGH",
            Priority::Medium => "MED",
            Priority::Low => "LOW",
        },
    }
}

pub fn render_task(t: &Task) -> String {
    let mut line = format!("[{}] {} | {} ({})", label(t), t.id, t.title, t.category);
    if let Some(due) = t.due_at {
        line.push_str(&format!(" due {}", due.format("%Y-%m-%d %H:%M")));
    }
    if let Some(until) = t.snoozed_until {
        line.push_str(&format!(" snoozed until {}", until.format("%Y-%m-%d %H:%M")));
    }
    line
}

pub fn render(store: &PoolStore, sel: Selection) -> String {
    let mut out = String::new();
    match sel {
        Selection::All => {
            let summary: Vec<String> = counts(store)
                .into_iter()
                .map(|(tag, n)| format!("{tag}={n}"))
                .collect();
            out.push_str(&format!(
                "# All tasks ({}) {}\n",
                total_count(store),
                summary.join(" ")
            ));
            for t in all_tasks(store) {
                out.push_str(&format!("- {}\n", render_task(t)));
            }
            if has_more_anywhere(store) {
                out.push_str("(more available)\n");
            }
        }
        Selection::One(tag) => {
            let pool = store.get(tag);
            out.push_str(&format!("# {tag} ({})\n", pool.len()));
            if !pool.loaded {
                out.push_str("(not loaded)\n");
            }
            for t in &pool.tasks {
                out.push_str(&format!("- {}\n", render_task(t)));
            }
            if pool.loaded && pool.has_more {
                out.push_str("(more available)\n");
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_parses_all_and_tags() {
        assert_eq!("ALL".parse::<Selection>().unwrap(), Selection::All);
        assert_eq!("low".parse::<Selection>().unwrap(), Selection::One(Tag::Low));
        assert!("soon".parse::<Selection>().is_err());
        assert_eq!(Selection::All.tags()[0], Tag::Missed);
    }

    #[test]
    fn all_view_lists_missed_first_with_counts() {
        let mut store = PoolStore::new();
        store.apply_first_page(
            Tag::High,
            vec![Task::new("h1", "Reply to John").with_priority(Priority::High)],
            true,
        );
        store.apply_first_page(
            Tag::Missed,
            vec![Task::new("m1", "Dentist")
                .with_priority(Priority::Low)
                .with_status(TaskStatus::Missed)
                .with_category("appointment")],
            false,
        );

        let out = render(&store, Selection::All);
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[0].contains("All tasks (2)"));
        assert!(lines[0].contains("missed=1 high=1 medium=0 low=0"));
        assert!(lines[1].starts_with("- [MISSED] m1 | Dentist (appointment)"));
        assert!(lines[2].starts_with("- [HIGH] h1"));
        assert_eq!(lines[3], "(more available)");
    }

    #[test]
    fn snooze_rejects_past_and_out_of_range_minutes() {
        let before = Utc::now();
        let change = snooze_for(30).unwrap();
        assert_eq!(change.status, TaskStatus::Snoozed);
        let until = change.snoozed_until.unwrap();
        assert!(until >= before + TimeDelta::minutes(30));

        assert!(snooze_for(0).is_err());
        assert!(snooze_for(-15).is_err());
        assert!(snooze_for(999_999_999_999_999).is_err());
        assert!(snooze_for(i64::MAX).is_err());
    }

    #[test]
    fn single_tag_view_flags_unloaded_pool() {
        let store = PoolStore::new();
        let out = render(&store, Selection::One(Tag::Medium));
        assert_eq!(out, "# medium (0)\n(not loaded)\n");
    }
}
