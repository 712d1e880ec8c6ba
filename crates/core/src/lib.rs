pub mod code;
pub mod config;
pub mod document;
pub mod error;
pub mod scanner;
pub mod tokens;

pub use code::FrameCode;
pub use config::{BeautifierConfig, PageSize};
pub use document::{FrameSource, SourceDocument};
pub use error::*;
pub use scanner::TokenScanner;
