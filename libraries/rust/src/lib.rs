//! Welcome to scannerpro!

/// Scanner Pro configuration module
pub mod config;

/// Scanner Pro upstream data module
pub mod data;

pub mod errors;

/// Scanner Pro quote fetching module
pub mod fetcher;

pub mod logger;

/// Scanner Pro quote models module
pub mod quote;

/// Scanner Pro universe registry module
pub mod universe;

pub use config::{BatchSettings, Config};
pub use errors::Error;
pub use fetcher::Fetcher;
pub use universe::UniverseRegistry;
