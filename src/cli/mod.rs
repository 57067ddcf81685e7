// src/cli/mod.rs - CLI definition (clap derive)

pub mod ingest;
pub mod progress;
pub mod run;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::infra::config::Config;

#[derive(Parser)]
#[command(
    name = "judgebench",
    about = "Score multi-model answers with an LLM judge, once per (question, model)",
    version
)]
pub struct Cli {
    /// Config file path (TOML)
    #[arg(long, global = true, env = "JUDGEBENCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Re-judge and re-append every pair, even ones already scored
    #[arg(long, global = true)]
    pub force: bool,

    /// Question groups judged at once
    #[arg(long, global = true)]
    pub concurrency: Option<usize>,

    /// Where to write the summary snapshot
    #[arg(long, global = true)]
    pub snapshot: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Judge every pending question group, then refresh the summary (default)
    Run,
    /// List pending question groups without calling the judge
    Pending,
    /// Refresh the summary snapshot only
    Summary,
    /// Append answer rows from a JSON file to the raw sheet
    Ingest {
        /// JSON array of rows, or an object with a `rows` array
        file: PathBuf,
    },
}

impl Cli {
    /// Flags win over file and environment settings.
    pub fn apply_overrides(&self, config: &mut Config) {
        if self.force {
            config.run.force_reeval = true;
        }
        if let Some(n) = self.concurrency {
            config.run.concurrency = n.max(1);
        }
        if let Some(ref path) = self.snapshot {
            config.run.snapshot_path = path.clone();
        }
    }
}
