//! Reference rewriting: the pattern catalog and the processor applying it.

mod patterns;
mod processor;

pub use patterns::{CustomPattern, PatternCatalog, ReferencePattern, ReferenceRule};
pub use processor::{FileProcessor, FileProcessorBuilder, replacement_tag};
