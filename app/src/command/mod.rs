//! Static strategy pattern for CLI commands.
//!
//! Each command is a separate strategy type with its own input type, so
//! dispatch is resolved at compile time.

use medtrack_config::Config;
use medtrack_core::Medication;
use medtrack_store::MedicationStore;
use tracing::info;

mod info;
mod init;
mod med;
mod scan;
mod user;
mod version;

pub use info::InfoStrategy;
pub use init::InitStrategy;
pub use med::{MedAction, MedStrategy};
pub use scan::{ScanInput, ScanStrategy};
pub use user::{UserAction, UserStrategy};
pub use version::VersionStrategy;

/// Core trait defining the contract for all command strategies.
pub trait CommandStrategy: Send + Sync + 'static {
    /// The input type this strategy accepts.
    type Input;

    /// Execute the command with the given input.
    ///
    /// # Errors
    /// Returns an error if command execution fails.
    async fn execute(&self, input: Self::Input) -> anyhow::Result<()>;
}

/// Config plus an open record store, shared by the data commands.
struct Common {
    config: Config,
    store: MedicationStore,
}

async fn init_common_components() -> anyhow::Result<Common> {
    let config = Config::load()?;
    info!("Opening record store");
    let store = MedicationStore::connect(&config.database.url).await?;
    Ok(Common { config, store })
}

fn print_medication(medication: &Medication) {
    println!(
        "{}  {} | {} | {}x/day | {}",
        medication.id,
        medication.medication,
        medication.dosage,
        medication.times_per_day,
        medication.times_to_take
    );
}
