pub mod config;
pub mod error;
pub mod format;
pub mod logger;
pub mod model;
pub mod parser;
pub mod pipeline;
pub mod pptx;
pub mod prompt;
pub mod query;
pub mod slides;
pub mod storage;

pub use error::{LookupError, LookupWarning, Result};
