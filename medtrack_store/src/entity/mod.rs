pub mod medications;
pub mod users;
