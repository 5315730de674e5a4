pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliArgs;

pub use adapters::{FeedSource, FtpClient, GoogleSheetsClient};
pub use config::AppConfig;
pub use self::core::{exporter::SheetsExporter, import::ImportHandler};
pub use domain::model::{ImportOptions, ImportOutcome, ImportStage, ImportSummary, Record};
pub use utils::error::{Result, SheetCastError};
