//! Earthmover CLI - rent equipment and track bookings from the terminal.
//!
//! Thin dispatch over earthmover-core: the REST client, the booking flow,
//! and the polling coordinator all live there.

mod cli;
mod commands;
mod error;
mod session_store;

use clap::Parser;

use crate::cli::{BookingCommands, Cli, Commands, MachineCommands, ProfileCommands};
use crate::commands::booking::BookingAction;
use crate::commands::common::CliContext;
use crate::commands::{auth_cmd, booking, completions, config, machines, profile, summary, watch};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let api_url_flag = cli.api_url.as_deref();

    match cli.command {
        Commands::Auth { command } => auth_cmd::run_auth(command, api_url_flag).await?,
        Commands::Machines { command } => {
            let context = CliContext::new(api_url_flag)?;
            match command {
                MachineCommands::List {
                    available_only,
                    json,
                } => machines::run_list(&context, available_only, json).await?,
                MachineCommands::Show { id, json } => {
                    machines::run_show(&context, id, json).await?;
                }
            }
        }
        Commands::Estimate { machine, duration } => {
            let context = CliContext::new(api_url_flag)?;
            booking::run_estimate(&context, machine, &duration).await?;
        }
        Commands::Book {
            machine,
            date,
            time,
            duration,
            location,
        } => {
            let context = CliContext::new(api_url_flag)?;
            booking::run_book(&context, machine, date, &time, &duration, &location).await?;
        }
        Commands::Bookings { command } => {
            let context = CliContext::new(api_url_flag)?;
            match command {
                BookingCommands::List { json } => booking::run_list(&context, json).await?,
                BookingCommands::Accept { id } => {
                    booking::run_action(&context, BookingAction::Accept, id).await?;
                }
                BookingCommands::Decline { id } => {
                    booking::run_action(&context, BookingAction::Decline, id).await?;
                }
                BookingCommands::Complete { id } => {
                    booking::run_action(&context, BookingAction::Complete, id).await?;
                }
                BookingCommands::Cancel { id } => {
                    booking::run_action(&context, BookingAction::Cancel, id).await?;
                }
                BookingCommands::Watch { id } => watch::run_booking_watch(&context, id).await?,
            }
        }
        Commands::Dashboard { json } => {
            let context = CliContext::new(api_url_flag)?;
            summary::run_dashboard(&context, json).await?;
        }
        Commands::Earnings { json } => {
            let context = CliContext::new(api_url_flag)?;
            summary::run_earnings(&context, json).await?;
        }
        Commands::Watch { fast } => {
            let context = CliContext::new(api_url_flag)?;
            watch::run_watch(&context, fast).await?;
        }
        Commands::Profile { command } => {
            let context = CliContext::new(api_url_flag)?;
            match command {
                ProfileCommands::Show { json } => profile::run_show(&context, json).await?,
                ProfileCommands::Update {
                    name,
                    phone,
                    email,
                    address,
                    photo,
                } => profile::run_update(&context, name, phone, email, address, photo).await?,
            }
        }
        Commands::Config { command } => config::run_config(command, api_url_flag)?,
        Commands::Completions { shell, output } => {
            completions::run_completions(shell, output.as_deref())?;
        }
    }

    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_env("EARTHMOVER_LOG").unwrap_or_else(
        |_| tracing_subscriber::EnvFilter::new("earthmover_core=info,earthmover_cli=info"),
    );
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
