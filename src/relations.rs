//! Cross-document reference handling: list maintenance on create and
//! reference expansion on read.

pub mod expander;
pub mod maintainer;

pub use expander::{ExpandedRequest, QueryExpander};
pub use maintainer::ReferenceMaintainer;
