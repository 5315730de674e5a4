pub mod exporter;
pub mod import;
pub mod tabularizer;

pub use crate::domain::model::{HeaderSet, ImportOutcome, Record};
pub use crate::domain::ports::{ContentSource, SheetWriter};
pub use crate::utils::error::Result;
