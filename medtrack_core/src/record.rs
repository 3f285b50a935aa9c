//! Users, their medications, and the repository seams the store implements.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::extraction::ExtractedMedication;

/// Typed store failures. Repositories return them inside `anyhow::Error`;
/// use `downcast_ref::<StoreError>()` to branch on them.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Entity not found: {entity} {id}")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("Forbidden action")]
    Forbidden,

    #[error("Uniqueness conflict: {field}")]
    Conflict { field: &'static str },

    #[error("Validation error: {message}")]
    Validation { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl NewUser {
    pub fn validate(&self) -> Result<(), StoreError> {
        let email = self.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(StoreError::Validation {
                message: format!("invalid email address: {:?}", self.email),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medication {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub medication: String,
    pub dosage: String,
    pub times_per_day: u32,
    pub times_to_take: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMedication {
    pub owner_id: Uuid,
    pub medication: String,
    pub dosage: String,
    pub times_per_day: u32,
    pub times_to_take: String,
}

impl NewMedication {
    /// Record for `owner_id` built from a label scan. Sentinel values are kept.
    #[must_use]
    pub fn from_extraction(owner_id: Uuid, extracted: &ExtractedMedication) -> Self {
        Self {
            owner_id,
            medication: extracted.medication.clone(),
            dosage: extracted.dosage.clone(),
            times_per_day: extracted.times_per_day,
            times_to_take: extracted.times_to_take.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), StoreError> {
        require("medication", &self.medication)?;
        require("dosage", &self.dosage)?;
        require("times_to_take", &self.times_to_take)
    }
}

/// Partial update of a medication; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicationPatch {
    pub medication: Option<String>,
    pub dosage: Option<String>,
    pub times_per_day: Option<u32>,
    pub times_to_take: Option<String>,
}

impl MedicationPatch {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.medication.is_none()
            && self.dosage.is_none()
            && self.times_per_day.is_none()
            && self.times_to_take.is_none()
    }

    pub fn validate(&self) -> Result<(), StoreError> {
        if let Some(value) = &self.medication {
            require("medication", value)?;
        }
        if let Some(value) = &self.dosage {
            require("dosage", value)?;
        }
        if let Some(value) = &self.times_to_take {
            require("times_to_take", value)?;
        }
        Ok(())
    }

    /// Copy the set fields onto `medication`.
    pub fn apply_to(&self, medication: &mut Medication) {
        if let Some(value) = &self.medication {
            medication.medication.clone_from(value);
        }
        if let Some(value) = &self.dosage {
            medication.dosage.clone_from(value);
        }
        if let Some(value) = self.times_per_day {
            medication.times_per_day = value;
        }
        if let Some(value) = &self.times_to_take {
            medication.times_to_take.clone_from(value);
        }
    }
}

fn require(field: &str, value: &str) -> Result<(), StoreError> {
    if value.trim().is_empty() {
        return Err(StoreError::Validation {
            message: format!("{field} is required"),
        });
    }
    Ok(())
}

#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn create_user(&self, user: &NewUser) -> anyhow::Result<User>;

    async fn find_user(&self, id: &Uuid) -> anyhow::Result<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;

    async fn list_users(&self) -> anyhow::Result<Vec<User>>;
}

/// Owner-scoped medication storage. Only the owning user may change or
/// delete a record; other callers get [`StoreError::Forbidden`].
#[async_trait]
pub trait MedicationRepo: Send + Sync {
    async fn create_medication(&self, medication: &NewMedication) -> anyhow::Result<Medication>;

    async fn find_medication(&self, id: &Uuid) -> anyhow::Result<Option<Medication>>;

    async fn update_medication(
        &self,
        id: &Uuid,
        owner_id: &Uuid,
        patch: &MedicationPatch,
    ) -> anyhow::Result<Medication>;

    async fn delete_medication(&self, id: &Uuid, owner_id: &Uuid) -> anyhow::Result<()>;

    async fn list_medications(&self, owner_id: &Uuid) -> anyhow::Result<Vec<Medication>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(owner_id: Uuid) -> Medication {
        let now = Utc::now();
        Medication {
            id: Uuid::now_v7(),
            owner_id,
            medication: "Amoxicillin".to_string(),
            dosage: "500mg".to_string(),
            times_per_day: 3,
            times_to_take: "With meals".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn from_extraction_keeps_sentinels() {
        let owner = Uuid::now_v7();
        let extracted = ExtractedMedication {
            medication: "Ibuprofen".to_string(),
            dosage: "200mg".to_string(),
            times_per_day: 0,
            times_to_take: "Unknown".to_string(),
        };
        let record = NewMedication::from_extraction(owner, &extracted);

        assert_eq!(record.owner_id, owner);
        assert_eq!(record.times_to_take, "Unknown");
        assert!(record.validate().is_ok());
    }

    #[test]
    fn blank_fields_fail_validation() {
        let record = NewMedication {
            owner_id: Uuid::now_v7(),
            medication: " ".to_string(),
            dosage: "1mg".to_string(),
            times_per_day: 1,
            times_to_take: "Night".to_string(),
        };
        assert_eq!(
            record.validate(),
            Err(StoreError::Validation {
                message: "medication is required".to_string()
            })
        );
    }

    #[test]
    fn patch_applies_only_set_fields() {
        let mut medication = sample(Uuid::now_v7());
        let patch = MedicationPatch {
            dosage: Some("250mg".to_string()),
            times_per_day: Some(2),
            ..MedicationPatch::default()
        };
        patch.apply_to(&mut medication);

        assert_eq!(medication.medication, "Amoxicillin");
        assert_eq!(medication.dosage, "250mg");
        assert_eq!(medication.times_per_day, 2);
        assert!(!patch.is_empty());
        assert!(MedicationPatch::default().is_empty());
    }

    #[test]
    fn user_email_must_look_like_an_address() {
        let user = NewUser {
            email: "not-an-email".to_string(),
            ..NewUser::default()
        };
        assert!(user.validate().is_err());

        let user = NewUser {
            email: "ana@example.com".to_string(),
            ..NewUser::default()
        };
        assert!(user.validate().is_ok());
    }
}
