pub mod assistant;
#[cfg(feature = "gemini")]
pub mod client;
pub mod extractor;
pub mod face;
pub mod prompts;
pub mod types;
pub mod utils;

pub use assistant::*;
#[cfg(feature = "gemini")]
pub use client::*;
pub use extractor::*;
pub use face::*;
pub use types::*;
