// hoist-common/src/lib.rs
pub mod config;
pub mod error;
pub mod version;

// Re-export key types
pub use config::{Config, UpdateFailurePolicy};
pub use error::{HoistError, Result};
pub use version::{Version, SENTINEL_VERSION};
