//! Error type for `wfd-xml`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("xml error: {0}")]
  Xml(String),

  #[error("expected a <{expected}> document, found <{found}>")]
  UnexpectedRoot {
    expected: &'static str,
    found:    String,
  },

  #[error("document contains no root element")]
  NoRoot,

  #[error("cannot read {path:?}: {source}")]
  Io {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
