pub mod mocks;
pub mod setup;

// Re-export main utilities for use by test files
#[allow(unused_imports)]
pub use mocks::FakePresenceBackend;
#[allow(unused_imports)]
pub use setup::{identity, token, TestSetup};
