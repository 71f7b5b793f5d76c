//! Reading Water Framework Directive report documents.
//!
//! [`ReportParser`] turns an `RBDSUCA` or `SWB` XML document into harvested
//! records; [`load_records`] fetches the document from a file or an
//! `http(s)://` URL first and stamps each record with where and when it was
//! read.

mod parse;
mod source;

pub mod error;

pub use error::{Error, Result};
pub use parse::ReportParser;
pub use source::{Source, load_records};
