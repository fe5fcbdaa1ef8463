pub mod auth;
pub mod entities;
pub mod error;
pub mod store;

pub use error::{ModelError, Result};

// Re-export tracing for use in this crate
pub use tracing;
