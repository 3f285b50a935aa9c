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

pub mod error;
pub mod extraction;
pub mod record;
pub mod scan;
pub mod vision;

pub use error::Error;
pub use extraction::{
    ExtractedMedication, Extraction, ExtractionResult, Field, LabelParser, ParseFailure,
    UNKNOWN, parse_label_response,
};
pub use record::{
    Medication, MedicationPatch, MedicationRepo, NewMedication, NewUser, StoreError, User,
    UserRepo,
};
pub use scan::{LABEL_PROMPT, LabelImage, LabelScanner};
pub use vision::{GenerationConfig, VisionClient, VisionRequest};
