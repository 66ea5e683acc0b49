pub mod normalize;
pub mod source;

pub use normalize::normalize_text;
pub use source::{ExtractedFile, PageSource};
