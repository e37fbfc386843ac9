use std::env;
use std::path::PathBuf;

use crate::models::Assignee;

/// The acting user, as supplied by the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub name: String,
    pub avatar_url: Option<String>,
}

impl Identity {
    pub fn new(user_id: impl Into<String>, name: impl Into<String>) -> Self {
        Identity {
            user_id: user_id.into(),
            name: name.into(),
            avatar_url: None,
        }
    }

    pub fn as_assignee(&self) -> Assignee {
        Assignee {
            user_id: self.user_id.clone(),
            name: self.name.clone(),
            avatar_url: self.avatar_url.clone(),
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path of `chores.json`; households and members are stored alongside.
    pub db_path: PathBuf,
    pub identity: Identity,
    /// Household id or id prefix used when a command does not name one.
    pub household: Option<String>,
    /// `tracing` filter directive.
    pub log_filter: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// The database path is determined in the following order:
    /// 1. `CHORES_DB` environment variable.
    /// 2. `~/.local/share/choreboard/chores.json` (on Linux).
    /// 3. `./chores.json` (fallback).
    pub fn from_env() -> Self {
        let user_id = non_empty_env("CHOREBOARD_USER")
            .or_else(|| non_empty_env("USER"))
            .unwrap_or_else(|| "local".to_string());
        let name = non_empty_env("CHOREBOARD_NAME").unwrap_or_else(|| user_id.clone());

        Self {
            db_path: db_path(),
            identity: Identity {
                user_id,
                name,
                avatar_url: non_empty_env("CHOREBOARD_AVATAR"),
            },
            household: non_empty_env("CHOREBOARD_HOUSEHOLD"),
            log_filter: non_empty_env("CHOREBOARD_LOG").unwrap_or_else(|| "warn".to_string()),
        }
    }

    /// Directory holding all data files (and the TUI log).
    pub fn data_dir(&self) -> PathBuf {
        let mut p = self.db_path.clone();
        p.pop();
        p
    }
}

fn db_path() -> PathBuf {
    non_empty_env("CHORES_DB").map(PathBuf::from).unwrap_or_else(|| {
        let mut p = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
        p.push("choreboard");
        p.push("chores.json");
        p
    })
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
