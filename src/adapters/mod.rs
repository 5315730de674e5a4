// Adapters layer: concrete implementations for external systems (local disk, FTP, Google Sheets).

pub mod ftp;
pub mod google_auth;
pub mod sheets;
pub mod source;

pub use ftp::FtpClient;
pub use sheets::GoogleSheetsClient;
pub use source::FeedSource;
