//! Mapping and claim synthesis for Water Framework Directive reports.
//!
//! Harvested records are normalized through the [`mapping::MappingTable`],
//! resolved to knowledge-base entities, turned into statements and merged
//! against what the knowledge base already holds. The
//! [`coordinator::Coordinator`] runs that pipeline over a whole document.

pub mod coordinator;
pub mod error;
pub mod mapping;
pub mod merge;
pub mod normalize;
pub mod preview;
pub mod resolve;
pub mod synthesize;

pub use error::{MappingError, RecordError, Result};
