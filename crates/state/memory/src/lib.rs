mod store;

pub use store::MemoryEnvelopeStore;
