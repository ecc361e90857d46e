//! Command-line driver for poking at a marketplace API.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::env;
use std::ffi::OsString;
use std::io::{self, Write};

use clap::{Parser, Subcommand};
use ortho_config::OrthoConfig;
use color_eyre::eyre::{Result, WrapErr, eyre};
use serde::Serialize;
use tokio::runtime::Builder;

use marketplace_client::MarketplaceClient;
use marketplace_client::config::ClientSettings;
use marketplace_client::domain::models::JobStatus;
use marketplace_client::domain::operations::{JobQuery, ListJobs};
use marketplace_client::telemetry::init_tracing;

const PASSWORD_VAR: &str = "MARKETPLACE_PASSWORD";

/// `marketplace-cli` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "marketplace-cli",
    about = "Query the marketplace API and print results as JSON lines",
    version
)]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// List every category.
    Categories,
    /// List jobs, optionally filtered by status.
    Jobs {
        /// Only jobs in this state (`open`, `assigned`, `completed`, `cancelled`).
        #[arg(long, value_parser = parse_status)]
        status: Option<JobStatus>,
    },
    /// Show one user's profile.
    Profile {
        /// Username to look up.
        username: String,
    },
    /// Sign in; the password is read from `MARKETPLACE_PASSWORD`.
    Login {
        /// Username or email.
        username: String,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("create Tokio runtime")?;
    runtime.block_on(async_main())
}

async fn async_main() -> Result<()> {
    let args = CliArgs::parse();
    init_tracing();

    let settings = ClientSettings::load_from_iter([OsString::from("marketplace-cli")])
        .wrap_err("load client settings")?;
    let client = MarketplaceClient::from_settings(&settings).wrap_err("build client")?;

    match args.command {
        Command::Categories => {
            let categories = client.categories().fetch(false).await?;
            emit_all(categories.iter())
        }
        Command::Jobs { status } => {
            let jobs = client
                .dispatcher()
                .call::<ListJobs>(JobQuery {
                    status,
                    ..JobQuery::default()
                })
                .await?;
            emit_all(jobs.iter())
        }
        Command::Profile { username } => {
            let profile = client.profiles().get(&username, false).await?;
            emit_all([&profile])
        }
        Command::Login { username } => {
            let password = read_password()?;
            let identity = client.login(&username, &password).await?;
            emit_all([&identity])
        }
    }
}

fn emit_all<'a, T, I>(items: I) -> Result<()>
where
    T: Serialize + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut out = io::stdout().lock();
    for item in items {
        let line = serde_json::to_string(item).wrap_err("encode output")?;
        writeln!(out, "{line}").wrap_err("write output")?;
    }
    Ok(())
}

fn read_password() -> Result<String> {
    let password = env::var(PASSWORD_VAR)
        .map_err(|_| eyre!("password missing: set {PASSWORD_VAR}"))?;
    if password.is_empty() {
        return Err(eyre!("{PASSWORD_VAR} must not be empty"));
    }
    Ok(password)
}

fn parse_status(raw: &str) -> Result<JobStatus, String> {
    let status: JobStatus = serde_json::from_value(serde_json::Value::String(raw.to_owned()))
        .map_err(|error| format!("invalid job status: {error}"))?;
    if status == JobStatus::Unknown {
        return Err(format!("unknown job status `{raw}`"));
    }
    Ok(status)
}

#[cfg(test)]
mod tests {
    //! Unit tests for CLI parsing helpers.

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("open", JobStatus::Open)]
    #[case("assigned", JobStatus::Assigned)]
    #[case("cancelled", JobStatus::Cancelled)]
    fn status_parser_accepts_known_states(#[case] raw: &str, #[case] expected: JobStatus) {
        assert_eq!(parse_status(raw).expect("status should parse"), expected);
    }

    #[rstest]
    fn status_parser_rejects_unknown_states() {
        let error = parse_status("paused").expect_err("unknown state");
        assert!(error.contains("paused"));
    }

    #[rstest]
    fn jobs_subcommand_parses_status_flag() {
        let args = CliArgs::try_parse_from(["marketplace-cli", "jobs", "--status", "open"])
            .expect("args parse");
        assert!(matches!(
            args.command,
            Command::Jobs {
                status: Some(JobStatus::Open)
            }
        ));
    }
}
