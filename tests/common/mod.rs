pub mod builders;
pub mod harness;
pub mod provider;

// Re-export commonly used test utilities
pub use harness::TestHarness;
pub use provider::{ScriptedProvider, Step};
