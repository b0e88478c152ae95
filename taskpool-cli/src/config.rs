use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::time::Duration;

use crate::state::ensure_taskpool_home;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerSection,
    #[serde(default)]
    pub display: DisplaySection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSection {
    pub base_url: String,
    /// Account whose tasks are listed. Required before any command talks to
    /// the server.
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplaySection {
    /// Records fetched per page, per tag.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_snooze_minutes")]
    pub snooze_minutes: i64,
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_page_size() -> u32 {
    20
}

fn default_snooze_minutes() -> i64 {
    60
}

impl Default for DisplaySection {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            snooze_minutes: default_snooze_minutes(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerSection {
                base_url: "http://localhost:8000".to_string(),
                user_id: None,
                timeout_secs: default_timeout_secs(),
            },
            display: DisplaySection::default(),
        }
    }
}

impl Config {
    /// Apply `TASKPOOL_BASE_URL` / `TASKPOOL_USER_ID` on top of the file.
    pub fn with_env(mut self) -> Self {
        if let Ok(url) = std::env::var("TASKPOOL_BASE_URL") {
            self.server.base_url = url;
        }
        if let Ok(user) = std::env::var("TASKPOOL_USER_ID") {
            self.server.user_id = Some(user);
        }
        self
    }

    pub fn user_id(&self) -> Result<&str> {
        match self.server.user_id.as_deref() {
            Some(u) if !u.trim().is_empty() => Ok(u),
            _ => bail!(
                "no user_id configured; set server.user_id in {} or TASKPOOL_USER_ID",
                config_path().map(|p| p.display().to_string()).unwrap_or_default()
            ),
        }
    }

    pub fn page_size(&self) -> Result<NonZeroU32> {
        NonZeroU32::new(self.display.page_size).context("display.page_size must be at least 1")
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.server.timeout_secs)
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_taskpool_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    let p = config_path()?;
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    parse_config(&s)
}

fn parse_config(s: &str) -> Result<Config> {
    toml::from_str(s).context("parse config.toml")
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let p = config_path()?;
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default())?;
    println!("Wrote {}", p.display());
    println!("Set server.user_id before listing tasks.");
    Ok(())
}

pub fn show_config() -> Result<()> {
    let cfg = load_config()?.with_env();
    println!("# {}", config_path()?.display());
    print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
    Ok(())
}
