//! Runtime settings shared by every command.

use crate::state::markers::FailedMovePolicy;
use clap::Args;
use std::fs;
use std::io;
use std::path::PathBuf;

pub const DEFAULT_API_URL: &str = "https://suhyun444.duckdns.org";
const DB_FILE: &str = "lifehub.db";
const LOG_FILE: &str = "lifehub.log";

#[derive(Debug, Clone, Args)]
pub struct GlobalArgs {
    /// Backend base URL
    #[arg(long, env = "LIFEHUB_API_URL", default_value = DEFAULT_API_URL, global = true)]
    pub api_url: String,

    /// Data directory (default: ~/.lifehub)
    #[arg(short, long, env = "LIFEHUB_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Print the login URL instead of opening a browser
    #[arg(long, env = "LIFEHUB_NO_BROWSER", global = true)]
    pub no_browser: bool,

    /// Restore the previous marker order when a move fails to sync
    #[arg(long, env = "LIFEHUB_ROLLBACK_MOVES", global = true)]
    pub rollback_moves: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_url: String,
    pub data_dir: PathBuf,
    pub open_browser: bool,
    pub move_policy: FailedMovePolicy,
}

impl Config {
    pub fn from_args(args: &GlobalArgs) -> Self {
        Self {
            api_url: args.api_url.trim_end_matches('/').to_string(),
            data_dir: args.data_dir.clone().unwrap_or_else(default_data_dir),
            open_browser: !args.no_browser,
            move_policy: if args.rollback_moves {
                FailedMovePolicy::Rollback
            } else {
                FailedMovePolicy::KeepLocal
            },
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE)
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join(LOG_FILE)
    }

    pub fn ensure_data_dir(&self) -> io::Result<()> {
        fs::create_dir_all(&self.data_dir)
    }
}

/// Get the default data directory (~/.lifehub)
pub fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".lifehub")
}
