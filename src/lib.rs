pub mod config;
pub mod core;
pub mod error;
pub mod export;
pub mod parser;
pub mod pipeline;
pub mod segment;

pub use config::RuleSet;
pub use crate::core::model::{
    DocumentType, Language, Page, PageClass, Segment, StudentPacket, CANONICAL_ORDER,
};
pub use error::{PacketError, Result};
pub use parser::{ExtractedFile, PageSource};
pub use pipeline::{build_batch, export_batch, BatchOutcome, Pipeline, PipelineConfig};
pub use segment::{Assembly, BoundaryResolver, Resolution};
