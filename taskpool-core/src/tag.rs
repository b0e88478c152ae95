//! Classification tags: the partitioning key for pools.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::task::{Priority, TaskStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tag {
    High,
    Medium,
    Low,
    Missed,
}

/// Server-side filter a tag maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagFilter {
    pub status: TaskStatus,
    pub priority: Option<Priority>,
}

impl Tag {
    pub const ALL: [Tag; 4] = [Tag::High, Tag::Medium, Tag::Low, Tag::Missed];

    /// Order used by the combined "all" view: missed first, then by priority.
    pub const DISPLAY_ORDER: [Tag; 4] = [Tag::Missed, Tag::High, Tag::Medium, Tag::Low];

    pub fn as_str(self) -> &'static str {
        match self {
            Tag::High => "high",
            Tag::Medium => "medium",
            Tag::Low => "low",
            Tag::Missed => "missed",
        }
    }

    pub fn filter(self) -> TagFilter {
        match self {
            Tag::High => TagFilter {
                status: TaskStatus::Pending,
                priority: Some(Priority::High),
            },
            Tag::Medium => TagFilter {
                status: TaskStatus::Pending,
                priority: Some(Priority::Medium),
            },
            Tag::Low => TagFilter {
                status: TaskStatus::Pending,
                priority: Some(Priority::Low),
            },
            Tag::Missed => TagFilter {
                status: TaskStatus::Missed,
                priority: None,
            },
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Tag::High => 0,
            Tag::Medium => 1,
            Tag::Low => 2,
            Tag::Missed => 3,
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tag {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "high" => Tag::High,
            "medium" => Tag::Medium,
            "low" => Tag::Low,
            "missed" => Tag::Missed,
            other => bail!("unknown tag: {other} (expected high, medium, low or missed)"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_tags_filter_pending() {
        for tag in [Tag::High, Tag::Medium, Tag::Low] {
            assert_eq!(tag.filter().status, TaskStatus::Pending);
            assert!(tag.filter().priority.is_some());
        }
        assert_eq!(Tag::Missed.filter().status, TaskStatus::Missed);
        assert_eq!(Tag::Missed.filter().priority, None);
    }

    #[test]
    fn index_is_dense() {
        let mut seen = [false; 4];
        for tag in Tag::ALL {
            seen[tag.index()] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn parses_tag_names() {
        assert_eq!("MISSED".parse::<Tag>().unwrap(), Tag::Missed);
        assert!("urgent".parse::<Tag>().is_err());
    }
}
