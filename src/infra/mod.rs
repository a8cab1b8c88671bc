pub mod doctor;
pub mod google_api;
pub mod secrets;
