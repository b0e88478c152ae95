//! Interactive loop over one engine instance, so pools and the error slot
//! persist between commands.

use anyhow::{bail, Context, Result};
use std::io::Write;
use taskpool_core::{StatusChange, TaskStatus};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::commands::{render, reopen_change, App, Selection};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Load(Selection),
    More(Selection),
    Refresh(Selection),
    Show(Selection),
    Done(String),
    Ignore(String),
    Reopen(String),
    Snooze { id: String, minutes: Option<i64> },
    Retry,
    Help,
    Quit,
}

const HELP: &str = "\
commands:
  load <tag|all>            first page (skipped if already loaded)
  more <tag|all>            next page
  refresh <tag|all>         reset and reload page one
  show [tag|all]            print pools (default: all)
  done|ignore|reopen <id>   change a task's status
  snooze <id> [minutes]     snooze a task
  retry                     re-run the last failed operation
  quit";

pub fn parse_line(line: &str) -> Result<Option<ShellCommand>> {
    let mut words = line.split_whitespace();
    let Some(cmd) = words.next() else {
        return Ok(None);
    };
    let arg = words.next();

    let selection = |arg: Option<&str>| -> Result<Selection> {
        arg.context("expected a tag (high, medium, low, missed) or all")?
            .parse()
    };
    let id = |arg: Option<&str>| -> Result<String> {
        Ok(arg.context("expected a task id")?.to_string())
    };

    let parsed = match cmd.to_ascii_lowercase().as_str() {
        "load" => ShellCommand::Load(selection(arg)?),
        "more" => ShellCommand::More(selection(arg)?),
        "more-all" => ShellCommand::More(Selection::All),
        "refresh" => ShellCommand::Refresh(selection(arg)?),
        "show" | "ls" => ShellCommand::Show(match arg {
            Some(a) => a.parse()?,
            None => Selection::All,
        }),
        "done" => ShellCommand::Done(id(arg)?),
        "ignore" => ShellCommand::Ignore(id(arg)?),
        "reopen" => ShellCommand::Reopen(id(arg)?),
        "snooze" => {
            let id = id(arg)?;
            let minutes = match words.next() {
                Some(m) => Some(m.parse::<i64>().with_context(|| format!("bad minutes: {m}"))?),
                None => None,
            };
            ShellCommand::Snooze { id, minutes }
        }
        "retry" => ShellCommand::Retry,
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" | "q" => ShellCommand::Quit,
        other => bail!("unknown command: {other} (try help)"),
    };
    Ok(Some(parsed))
}

pub async fn run(app: &App) -> Result<()> {
    println!("taskpool shell; type help for commands");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        std::io::stdout().flush().ok();

        let Some(line) = lines.next_line().await.context("read stdin")? else {
            break;
        };
        let cmd = match parse_line(&line) {
            Ok(Some(cmd)) => cmd,
            Ok(None) => continue,
            Err(e) => {
                eprintln!("{e:#}");
                continue;
            }
        };
        if cmd == ShellCommand::Quit {
            break;
        }
        execute(app, cmd).await;

        if let Some(failure) = app.sync.state().error() {
            eprintln!("! {failure} (type retry to re-run: {})", failure.operation);
        }
    }
    Ok(())
}

async fn execute(app: &App, cmd: ShellCommand) {
    let loader = app.sync.loader();
    match cmd {
        ShellCommand::Load(sel) => {
            app.activate(sel).await;
            print!("{}", render(&app.sync.state().pools(), sel));
        }
        ShellCommand::More(sel) => {
            app.more(sel).await;
            print!("{}", render(&app.sync.state().pools(), sel));
        }
        ShellCommand::Refresh(sel) => {
            for tag in sel.tags() {
                loader.refresh(tag, app.page_size).await;
            }
            print!("{}", render(&app.sync.state().pools(), sel));
        }
        ShellCommand::Show(sel) => print!("{}", render(&app.sync.state().pools(), sel)),
        ShellCommand::Done(id) => set(app, &id, StatusChange::to(TaskStatus::Done)).await,
        ShellCommand::Ignore(id) => set(app, &id, StatusChange::to(TaskStatus::Ignored)).await,
        ShellCommand::Reopen(id) => set(app, &id, reopen_change()).await,
        ShellCommand::Snooze { id, minutes } => match app.snooze_change(minutes) {
            Ok(change) => set(app, &id, change).await,
            Err(e) => eprintln!("{e:#}"),
        },
        ShellCommand::Retry => {
            app.sync.retry().await;
        }
        ShellCommand::Help => println!("{HELP}"),
        ShellCommand::Quit => {}
    }
}

async fn set(app: &App, id: &str, change: StatusChange) {
    let status = change.status;
    if app.sync.mutator().set_status(id, change).await == taskpool_sync::Outcome::Applied {
        println!("{id} -> {status}");
    }
}
