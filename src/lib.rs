pub mod config;
pub mod constants;
pub mod countries;
pub mod error;
pub mod logging;
pub mod parser;
pub mod types;

// Engine
pub mod resolver;
pub mod session;
pub mod sync;
pub mod widget;

// Layered boundaries for application and infrastructure
pub mod app;
pub mod infra;

pub mod observability;

pub use error::{AddressError, Result};
pub use types::NormalizedAddress;
