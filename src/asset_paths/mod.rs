//! Asset reference helpers shared by the revved resolver, the rewriter and the pipeline writer.
//!
//! `filters` decides which references are left alone, `paths` holds the forward-slash path
//! algebra and `candidates` matches revved file names against an original one.

mod candidates;
mod filters;
mod paths;

pub use candidates::{
  CandidateSelection, RevConvention, RevvedPattern, expected_directory, select_candidate,
};
pub use filters::{
  is_external_reference, is_root_reference, is_template_expression, should_ignore_asset_reference,
};
pub use paths::{basename, dirname, join, normalize, replace_file_name};
