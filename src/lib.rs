pub mod ai;
pub mod config;
pub mod context;
pub mod history;
pub mod sanitize;

// Re-export commonly used types
pub use ai::AIError;
pub use config::Config;
pub use history::{HistorySource, ShellFamily};
