pub mod patient;
pub mod store;

pub use patient::PatientService;
pub use store::{JsonFileStore, MemoryStore, PatientDocument, RecordStore, StoreError};
