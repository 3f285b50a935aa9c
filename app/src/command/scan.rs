//! Label photo scan, optionally saved as a medication record.

use medtrack_core::extraction::report;
use medtrack_core::{
    Error, Extraction, LabelScanner, MedicationRepo, NewMedication, ParseFailure, StoreError,
    UserRepo,
};
use medtrack_providers::GeminiProvider;
use std::path::PathBuf;
use tracing::info;
use uuid::Uuid;

use super::{init_common_components, print_medication};
use crate::image::load_label_image;

#[derive(Debug, Clone)]
pub struct ScanInput {
    pub image: PathBuf,
    pub mime_type: Option<String>,
    /// Owner to save the record for; required with `save`
    pub owner_id: Option<Uuid>,
    pub save: bool,
    /// Print the tagged JSON result instead of text
    pub json: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct ScanStrategy;

impl super::CommandStrategy for ScanStrategy {
    type Input = ScanInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let common = init_common_components().await?;
        let config = &common.config;

        let provider = GeminiProvider::new(config.vision.timeout())?
            .with_base_url(config.providers.gemini.base_url.clone())
            .with_model(config.providers.gemini.model.clone());
        let scanner = LabelScanner::new(provider, config.api_key())
            .with_generation(config.vision.generation());

        let image = load_label_image(&input.image, input.mime_type.as_deref())?;
        let owner_id = if input.save {
            Some(require_owner(&common.store, input.owner_id).await?)
        } else {
            None
        };
        info!("Scanning label image: {}", input.image.display());

        let extraction = match scanner.scan(&image).await {
            Ok(extraction) => extraction,
            Err(Error::ParseFailure { raw_text }) if input.json => {
                let failure = ParseFailure {
                    raw_text: raw_text.clone(),
                };
                println!("{}", report::to_json(&Err(failure)));
                return Err(Error::ParseFailure { raw_text }.into());
            }
            Err(e) => return Err(e.into()),
        };

        if input.json {
            println!("{}", report::to_json(&Ok(extraction.clone())));
        } else {
            print_extraction(&extraction);
        }

        if let Some(owner_id) = owner_id {
            let created = common
                .store
                .create_medication(&NewMedication::from_extraction(
                    owner_id,
                    &extraction.medication,
                ))
                .await?;
            if !input.json {
                print!("Saved: ");
                print_medication(&created);
            }
        }

        Ok(())
    }
}

/// Resolve the owner for `--save` before the vision call is made.
async fn require_owner(store: &impl UserRepo, owner_id: Option<Uuid>) -> anyhow::Result<Uuid> {
    let Some(owner_id) = owner_id else {
        anyhow::bail!("--save needs --user <id> to know who owns the record");
    };
    if store.find_user(&owner_id).await?.is_none() {
        return Err(StoreError::NotFound {
            entity: "user",
            id: owner_id,
        }
        .into());
    }
    Ok(owner_id)
}

fn print_extraction(extraction: &Extraction) {
    let medication = &extraction.medication;
    println!("Medication:    {}", medication.medication);
    println!("Dosage:        {}", medication.dosage);
    println!("Times per day: {}", medication.times_per_day);
    println!("Times to take: {}", medication.times_to_take);

    if !extraction.is_complete() {
        let gaps = extraction
            .gaps
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        println!();
        println!("⚠️  Could not read from the label: {gaps}. Please review before relying on it.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medtrack_core::NewUser;
    use medtrack_store::MedicationStore;

    async fn memory_store() -> MedicationStore {
        let Ok(store) = MedicationStore::connect("sqlite::memory:").await else {
            panic!("in-memory store should open");
        };
        store
    }

    #[tokio::test]
    async fn save_without_user_is_rejected() {
        let store = memory_store().await;
        assert!(require_owner(&store, None).await.is_err());
    }

    #[tokio::test]
    async fn save_for_unknown_user_is_rejected() {
        let store = memory_store().await;
        let missing = Uuid::now_v7();

        let Err(err) = require_owner(&store, Some(missing)).await else {
            panic!("unknown owner must be rejected");
        };
        assert_eq!(
            err.downcast_ref::<StoreError>(),
            Some(&StoreError::NotFound {
                entity: "user",
                id: missing,
            })
        );
    }

    #[tokio::test]
    async fn save_for_existing_user_resolves_owner() {
        let store = memory_store().await;
        let Ok(user) = store
            .create_user(&NewUser {
                email: "ana@example.com".to_string(),
                first_name: None,
                last_name: None,
            })
            .await
        else {
            panic!("user should be created");
        };

        let owner = require_owner(&store, Some(user.id)).await;
        assert_eq!(owner.ok(), Some(user.id));
    }
}
