use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use earthmover_core::Role;

#[derive(Parser)]
#[command(name = "earthmover")]
#[command(about = "Rent earthmoving equipment from the command line")]
#[command(version)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Backend API base URL (overrides env and config file)
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in, inspect, or clear the stored session
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
    /// Browse the machine catalog
    Machines {
        #[command(subcommand)]
        command: MachineCommands,
    },
    /// Preview the cost of a rental
    Estimate {
        /// Machine id to price
        #[arg(long, value_name = "ID")]
        machine: i64,
        /// Duration text, e.g. "2 Hours 30 Min"
        #[arg(long, value_name = "TEXT")]
        duration: String,
    },
    /// Request a booking end to end
    Book {
        /// Machine id to book
        #[arg(long, value_name = "ID")]
        machine: i64,
        /// Scheduled date (YYYY-MM-DD)
        #[arg(long, value_name = "DATE")]
        date: NaiveDate,
        /// Scheduled start time (HH:MM)
        #[arg(long, value_name = "TIME")]
        time: String,
        /// Duration text, e.g. "2 Hours 30 Min"
        #[arg(long, value_name = "TEXT")]
        duration: String,
        /// Work site address
        #[arg(long, value_name = "TEXT")]
        location: String,
    },
    /// Inspect and act on bookings
    Bookings {
        #[command(subcommand)]
        command: BookingCommands,
    },
    /// Booking counts and spend for the signed-in account
    Dashboard {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Completed and outstanding earnings (operators)
    Earnings {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Follow live updates until interrupted
    Watch {
        /// Poll at the fast interval
        #[arg(long)]
        fast: bool,
    },
    /// Show or update the account profile
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
    /// Manage saved client configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Sign in and store the session
    Login {
        /// Account role
        #[arg(long, value_enum)]
        role: RoleArg,
        /// Phone number or email
        #[arg(long, value_name = "PHONE_OR_EMAIL")]
        identifier: String,
        /// Account password
        #[arg(long, value_name = "PASSWORD")]
        password: String,
    },
    /// Show who is signed in
    Status,
    /// Clear the stored session
    Logout,
}

#[derive(Subcommand)]
pub enum MachineCommands {
    /// List the machine catalog
    List {
        /// Only machines currently available
        #[arg(long)]
        available_only: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one machine in detail
    Show {
        /// Machine id
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum BookingCommands {
    /// List bookings for the signed-in account
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Accept a pending booking (operators)
    Accept {
        /// Booking id
        id: i64,
    },
    /// Decline a pending booking (operators)
    Decline {
        /// Booking id
        id: i64,
    },
    /// Mark an accepted or in-progress booking completed
    Complete {
        /// Booking id
        id: i64,
    },
    /// Cancel an accepted or in-progress booking
    Cancel {
        /// Booking id
        id: i64,
    },
    /// Follow one booking until it reaches a final status
    Watch {
        /// Booking id
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum ProfileCommands {
    /// Show the account profile
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Update profile fields
    Update {
        /// Display name
        #[arg(long, value_name = "TEXT")]
        name: Option<String>,
        /// Contact phone number
        #[arg(long, value_name = "PHONE")]
        phone: Option<String>,
        /// Contact email
        #[arg(long, value_name = "EMAIL")]
        email: Option<String>,
        /// Postal address
        #[arg(long, value_name = "TEXT")]
        address: Option<String>,
        /// Path to a JPEG profile photo
        #[arg(long, value_name = "PATH")]
        photo: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Save the backend API URL
    Init {
        /// Backend API base URL
        #[arg(long, value_name = "URL")]
        api_url: String,
    },
    /// Print the resolved configuration and its origin
    Show,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum RoleArg {
    Customer,
    Operator,
    Admin,
}

impl From<RoleArg> for Role {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Customer => Self::Customer,
            RoleArg::Operator => Self::Operator,
            RoleArg::Admin => Self::Admin,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn role_arg_maps_onto_core_roles() {
        assert_eq!(Role::from(RoleArg::Customer), Role::Customer);
        assert_eq!(Role::from(RoleArg::Operator), Role::Operator);
        assert_eq!(Role::from(RoleArg::Admin), Role::Admin);
    }
}
