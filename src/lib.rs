pub mod banner;
pub mod config;
pub mod engine;
pub mod error;
pub mod locator;
pub mod logging;
pub mod models;
pub mod mutator;
pub mod payloads;
pub mod raw;

// Re-export commonly used items
pub use config::*;
pub use engine::*;
pub use error::{Error, Result};
pub use locator::*;
pub use models::*;
pub use mutator::*;
pub use payloads::*;
pub use raw::*;
