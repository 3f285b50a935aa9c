#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

mod command;
mod image;

use clap::{Parser, Subcommand};
use command::{
    CommandStrategy, InfoStrategy, InitStrategy, MedAction, MedStrategy, ScanInput, ScanStrategy,
    UserAction, UserStrategy, VersionStrategy,
};
use medtrack_core::{MedicationPatch, NewMedication};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "medtrack")]
#[command(about = "Track prescribed medications, with label photo scanning", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read a medication label photo with the vision service
    Scan {
        /// Path to the label photo
        image: PathBuf,

        /// Override the MIME type detected from the file extension
        #[arg(long)]
        mime_type: Option<String>,

        /// Owner of the record when saving
        #[arg(short = 'u', long = "user")]
        user: Option<Uuid>,

        /// Save the result as a medication record
        #[arg(short = 's', long, requires = "user")]
        save: bool,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserCommands,
    },
    /// Manage a user's medications
    Med {
        #[command(subcommand)]
        action: MedCommands,
    },
    /// Show configuration and database status
    Info,
    /// Initialize configuration
    Init,
    /// Show version
    Version,
}

#[derive(Subcommand)]
enum UserCommands {
    /// Register a user
    Add {
        #[arg(short = 'e', long)]
        email: String,

        #[arg(long)]
        first_name: Option<String>,

        #[arg(long)]
        last_name: Option<String>,
    },
    /// List users
    List,
}

#[derive(Subcommand)]
enum MedCommands {
    /// Add a medication
    Add {
        #[arg(short = 'u', long = "user")]
        user: Uuid,

        #[arg(short = 'm', long)]
        medication: String,

        #[arg(short = 'd', long)]
        dosage: String,

        #[arg(short = 'n', long)]
        times_per_day: u32,

        #[arg(short = 't', long)]
        times_to_take: String,
    },
    /// List a user's medications
    List {
        #[arg(short = 'u', long = "user")]
        user: Uuid,
    },
    /// Change fields of a medication
    Update {
        id: Uuid,

        #[arg(short = 'u', long = "user")]
        user: Uuid,

        #[arg(short = 'm', long)]
        medication: Option<String>,

        #[arg(short = 'd', long)]
        dosage: Option<String>,

        #[arg(short = 'n', long)]
        times_per_day: Option<u32>,

        #[arg(short = 't', long)]
        times_to_take: Option<String>,
    },
    /// Delete a medication
    Delete {
        id: Uuid,

        #[arg(short = 'u', long = "user")]
        user: Uuid,
    },
}

impl From<UserCommands> for UserAction {
    fn from(command: UserCommands) -> Self {
        match command {
            UserCommands::Add {
                email,
                first_name,
                last_name,
            } => Self::Add {
                email,
                first_name,
                last_name,
            },
            UserCommands::List => Self::List,
        }
    }
}

impl From<MedCommands> for MedAction {
    fn from(command: MedCommands) -> Self {
        match command {
            MedCommands::Add {
                user,
                medication,
                dosage,
                times_per_day,
                times_to_take,
            } => Self::Add(NewMedication {
                owner_id: user,
                medication,
                dosage,
                times_per_day,
                times_to_take,
            }),
            MedCommands::List { user } => Self::List { owner_id: user },
            MedCommands::Update {
                id,
                user,
                medication,
                dosage,
                times_per_day,
                times_to_take,
            } => Self::Update {
                id,
                owner_id: user,
                patch: MedicationPatch {
                    medication,
                    dosage,
                    times_per_day,
                    times_to_take,
                },
            },
            MedCommands::Delete { id, user } => Self::Delete { id, owner_id: user },
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            image,
            mime_type,
            user,
            save,
            json,
        } => {
            ScanStrategy
                .execute(ScanInput {
                    image,
                    mime_type,
                    owner_id: user,
                    save,
                    json,
                })
                .await?;
        }
        Commands::User { action } => UserStrategy.execute(action.into()).await?,
        Commands::Med { action } => MedStrategy.execute(action.into()).await?,
        Commands::Info => InfoStrategy.execute(()).await?,
        Commands::Init => InitStrategy.execute(()).await?,
        Commands::Version => VersionStrategy.execute(()).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn save_requires_user() {
        let result = Cli::try_parse_from(["medtrack", "scan", "label.jpg", "--save"]);
        assert!(result.is_err());
    }

    #[test]
    fn med_update_builds_partial_patch() {
        let id = Uuid::now_v7();
        let user = Uuid::now_v7();
        let Ok(cli) = Cli::try_parse_from([
            "medtrack",
            "med",
            "update",
            &id.to_string(),
            "--user",
            &user.to_string(),
            "--dosage",
            "250mg",
        ]) else {
            panic!("update arguments should parse");
        };

        let Commands::Med { action } = cli.command else {
            panic!("expected med command");
        };
        let MedAction::Update {
            id: parsed_id,
            owner_id,
            patch,
        } = MedAction::from(action)
        else {
            panic!("expected update action");
        };

        assert_eq!(parsed_id, id);
        assert_eq!(owner_id, user);
        assert_eq!(patch.dosage.as_deref(), Some("250mg"));
        assert!(patch.medication.is_none());
        assert!(patch.times_per_day.is_none());
    }
}
