pub mod dead_letter;
pub mod error;
pub mod store;

pub use dead_letter::DeadLetter;
pub use error::StateError;
pub use store::EnvelopeStore;
