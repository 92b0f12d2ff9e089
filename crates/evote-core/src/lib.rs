pub mod config;
pub mod error;
pub mod types;

pub use error::{EvoteError, EvoteResult};
pub use types::SealMode;
