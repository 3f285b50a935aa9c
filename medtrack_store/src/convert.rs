use medtrack_core::{Medication, StoreError, User};

use crate::entity::{medications, users};

pub fn user_from_model(m: users::Model) -> User {
    User {
        id: m.id,
        email: m.email,
        first_name: m.first_name,
        last_name: m.last_name,
        created_at: m.created_at.and_utc(),
    }
}

pub fn medication_from_model(m: medications::Model) -> Medication {
    Medication {
        id: m.id,
        owner_id: m.user_id,
        medication: m.medication,
        dosage: m.dosage,
        times_per_day: u32::try_from(m.times_per_day).unwrap_or(0),
        times_to_take: m.times_to_take,
        created_at: m.created_at.and_utc(),
        updated_at: m.updated_at.and_utc(),
    }
}

pub fn times_per_day_to_column(value: u32) -> Result<i32, StoreError> {
    i32::try_from(value).map_err(|_| StoreError::Validation {
        message: format!("times_per_day out of range: {value}"),
    })
}

/// Emails are matched case-insensitively.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
