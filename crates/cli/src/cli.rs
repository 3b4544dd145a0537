//! CLI command definitions using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// strata - declarative reconciliation from YAML manifests
#[derive(Parser, Debug)]
#[command(name = "strata")]
#[command(version)]
#[command(about = "Reconcile declared component graphs against persisted state")]
#[command(
    long_about = "strata diffs a YAML manifest against a local state file and runs \
only the lifecycle hooks the diff requires: create for new nodes, update for \
compatible changes, delete+create for breaking ones, nothing for unchanged nodes."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Reconcile a manifest against the state file
    Apply {
        /// Manifest file (YAML)
        manifest: PathBuf,

        /// State file path
        #[arg(long, default_value = "strata-state.json")]
        state: PathBuf,

        /// Print the plan without running any hook or touching state
        #[arg(long, default_value_t = false)]
        plan_only: bool,
    },

    /// Tear down every node in a manifest, unconditionally
    Destroy {
        /// Manifest file (YAML)
        manifest: PathBuf,

        /// State file path
        #[arg(long, default_value = "strata-state.json")]
        state: PathBuf,

        /// Delete children before their parent (default is parent first)
        #[arg(long, default_value_t = false)]
        child_first: bool,
    },
}
