//! Type definitions for clawdash

mod config;
mod error;
mod pricing;
mod session;
mod summary;
mod usage;

pub use config::*;
pub use error::*;
pub use pricing::*;
pub use session::*;
pub use summary::*;
pub use usage::*;
