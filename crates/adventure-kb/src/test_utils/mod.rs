// Re-export the fake store
pub mod fake_store;
pub use fake_store::FakeGraphStore;
