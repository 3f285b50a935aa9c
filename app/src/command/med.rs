use medtrack_core::{MedicationPatch, MedicationRepo, NewMedication};
use uuid::Uuid;

use super::{init_common_components, print_medication};

#[derive(Debug, Clone)]
pub enum MedAction {
    Add(NewMedication),
    List {
        owner_id: Uuid,
    },
    Update {
        id: Uuid,
        owner_id: Uuid,
        patch: MedicationPatch,
    },
    Delete {
        id: Uuid,
        owner_id: Uuid,
    },
}

/// Strategy for owner-scoped medication management.
#[derive(Debug, Clone, Copy)]
pub struct MedStrategy;

impl super::CommandStrategy for MedStrategy {
    type Input = MedAction;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let common = init_common_components().await?;
        let store = &common.store;

        match input {
            MedAction::Add(medication) => {
                let created = store.create_medication(&medication).await?;
                print_medication(&created);
            }
            MedAction::List { owner_id } => {
                let medications = store.list_medications(&owner_id).await?;
                if medications.is_empty() {
                    println!("No medications recorded for {owner_id}.");
                }
                for medication in &medications {
                    print_medication(medication);
                }
            }
            MedAction::Update {
                id,
                owner_id,
                patch,
            } => {
                if patch.is_empty() {
                    anyhow::bail!("Nothing to update: pass at least one field to change");
                }
                let updated = store.update_medication(&id, &owner_id, &patch).await?;
                print_medication(&updated);
            }
            MedAction::Delete { id, owner_id } => {
                store.delete_medication(&id, &owner_id).await?;
                println!("Deleted medication {id}");
            }
        }

        Ok(())
    }
}
