use anyhow::Result;
use clap::{Parser, Subcommand};
use taskpool_core::{StatusChange, TaskStatus};

mod commands;
mod config;
mod logging;
mod shell;
mod state;

use commands::{App, Selection};

#[derive(Parser, Debug)]
#[command(name = "taskpool", version, about = "Prioritized task list client")]
struct Cli {
    /// Task service base URL (overrides config and TASKPOOL_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// User id (overrides config and TASKPOOL_USER_ID)
    #[arg(long, global = true)]
    user: Option<String>,

    /// Debug logging for the sync engine
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print tasks for one tag, or all tags combined
    List {
        /// high, medium, low, missed or all
        #[arg(long, default_value = "all")]
        tag: Selection,

        /// Pages to fetch per tag (default: 1)
        #[arg(long, default_value_t = 1)]
        pages: usize,
    },

    /// Mark a task done
    Done { id: String },

    /// Mark a task ignored
    Ignore { id: String },

    /// Put a task back to pending
    Reopen { id: String },

    /// Snooze a task
    Snooze {
        id: String,

        /// Minutes from now (default from config.display.snooze_minutes)
        #[arg(long)]
        minutes: Option<i64>,
    },

    /// Interactive session: load, page, refresh and update tasks
    Shell,

    /// Config file helpers
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default ~/.taskpool/config.toml
    Init,
    /// Print the effective configuration
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Command::Config { command } = &cli.command {
        return match command {
            ConfigCommand::Init => config::init_config(),
            ConfigCommand::Show => config::show_config(),
        };
    }

    let mut cfg = config::load_config()?.with_env();
    if let Some(url) = cli.base_url {
        cfg.server.base_url = url;
    }
    if let Some(user) = cli.user {
        cfg.server.user_id = Some(user);
    }
    let app = App::from_config(&cfg)?;

    match cli.command {
        Command::List { tag, pages } => commands::list(&app, tag, pages).await?,
        Command::Done { id } => {
            commands::set_status(&app, &id, StatusChange::to(TaskStatus::Done)).await?
        }
        Command::Ignore { id } => {
            commands::set_status(&app, &id, StatusChange::to(TaskStatus::Ignored)).await?
        }
        Command::Reopen { id } => commands::set_status(&app, &id, commands::reopen_change()).await?,
        Command::Snooze { id, minutes } => {
            let change = app.snooze_change(minutes)?;
            commands::set_status(&app, &id, change).await?
        }
        Command::Shell => shell::run(&app).await?,
        Command::Config { .. } => {}
    }

    Ok(())
}
