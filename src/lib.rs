// src/lib.rs
pub mod config;
pub mod dispatch;
pub mod error;
pub mod fetch;
pub mod process;
pub mod report;
pub mod sink;
pub mod table;

pub use config::Config;
pub use dispatch::Dispatcher;
pub use error::{ExtractError, Result};
pub use table::{NormalizedTable, TableKind};
