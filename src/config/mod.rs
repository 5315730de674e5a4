#[cfg(feature = "cli")]
pub mod cli;
pub mod settings;

pub use settings::{AppConfig, FtpConfig, LoggingConfig, SheetsConfig};
