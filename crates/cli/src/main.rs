//! `strata` binary entrypoint.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use strata_engine::{
    DestroyPolicy, Engine, EngineConfig, JsonFileStateStore, Report,
};

mod cli;
mod error;
mod manifest;

use cli::{Cli, Commands};
use error::Result;
use manifest::Manifest;

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Apply {
            manifest,
            state,
            plan_only,
        } => {
            let root = Manifest::load(&manifest).await?.build()?;
            let engine = open_engine(&state, DestroyPolicy::default()).await?;

            if plan_only {
                let plan = engine.plan(root).await?;
                if !plan.has_changes() {
                    println!("no changes");
                }
                for line in plan.render() {
                    println!("{line}");
                }
                return Ok(ExitCode::SUCCESS);
            }

            let report = engine.apply(root).await?;
            Ok(print_report(&report))
        }
        Commands::Destroy {
            manifest,
            state,
            child_first,
        } => {
            let policy = if child_first {
                DestroyPolicy::ChildFirst
            } else {
                DestroyPolicy::ParentFirst
            };
            let root = Manifest::load(&manifest).await?.build()?;
            let engine = open_engine(&state, policy).await?;
            let report = engine.destroy(root).await?;
            Ok(print_report(&report))
        }
    }
}

async fn open_engine(state: &Path, destroy_policy: DestroyPolicy) -> Result<Engine> {
    let store = Arc::new(JsonFileStateStore::open(state).await?);
    info!(state = %state.display(), "state store opened");
    Ok(Engine::with_config(store, EngineConfig { destroy_policy }))
}

/// Print executed events, then the failure if the run halted early.
fn print_report(report: &Report) -> ExitCode {
    for event in &report.events {
        println!("{} {}", event.kind, event.detail);
    }
    match &report.failure {
        None => ExitCode::SUCCESS,
        Some(failure) => {
            eprintln!(
                "failed: {} {}: {}",
                failure.kind, failure.identity, failure.reason
            );
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
