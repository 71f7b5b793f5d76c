//! Locating and reading the source document.

use std::{fmt, path::PathBuf};

use tracing::info;
use wfd_core::{
  config::ImportKind,
  record::{FIELD_RETRIEVAL_DATE, FIELD_SOURCE_URL, HarvestedRecord},
  store::RecordParser,
};

use crate::{
  ReportParser,
  error::{Error, Result},
};

/// Where a report document is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
  File(PathBuf),
  Url(String),
}

impl Source {
  /// `http://` and `https://` locations are URLs; anything else is a path.
  pub fn parse(raw: &str) -> Self {
    match raw.split_once("://") {
      Some(("http" | "https", _)) => Self::Url(raw.to_string()),
      _ => Self::File(PathBuf::from(raw)),
    }
  }

  /// The raw bytes of the document.
  pub async fn fetch(&self) -> Result<Vec<u8>> {
    match self {
      Self::File(path) => tokio::fs::read(path).await.map_err(|source| Error::Io {
        path: path.clone(),
        source,
      }),
      Self::Url(url) => {
        let response = reqwest::get(url).await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
      }
    }
  }
}

impl fmt::Display for Source {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::File(path) => write!(f, "{}", path.display()),
      Self::Url(url) => f.write_str(url),
    }
  }
}

/// Read and parse the document at `raw`.
///
/// Records from a URL are stamped with the URL and today's date, which end
/// up in the reference block of every statement.
pub async fn load_records(raw: &str, kind: ImportKind) -> Result<Vec<HarvestedRecord>> {
  let source = Source::parse(raw);
  let bytes = source.fetch().await?;
  let mut records = ReportParser::new(kind).parse(&bytes)?;

  if let Source::Url(url) = &source {
    let today = chrono::Local::now().date_naive().format("%Y-%m-%d").to_string();
    stamp(&mut records, url, &today);
  }

  info!(%source, records = records.len(), "loaded source document");
  Ok(records)
}

fn stamp(records: &mut [HarvestedRecord], url: &str, day: &str) {
  for record in records {
    record.push(FIELD_SOURCE_URL, url);
    record.push(FIELD_RETRIEVAL_DATE, day);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn scheme_decides_the_source() {
    assert_eq!(
      Source::parse("https://cdr.eionet.europa.eu/se/eu/wfd2016/rbd.xml"),
      Source::Url("https://cdr.eionet.europa.eu/se/eu/wfd2016/rbd.xml".into())
    );
    assert_eq!(
      Source::parse("data/rbd.xml"),
      Source::File(PathBuf::from("data/rbd.xml"))
    );
    assert_eq!(
      Source::parse("ftp://example.org/rbd.xml"),
      Source::File(PathBuf::from("ftp://example.org/rbd.xml"))
    );
  }

  #[test]
  fn stamping_adds_provenance_fields() {
    let mut records = vec![HarvestedRecord::new().with("euRBDCode", "SE1")];
    stamp(&mut records, "http://example.org/rbd.xml", "2017-06-01");
    assert_eq!(records[0].get(FIELD_SOURCE_URL), Some("http://example.org/rbd.xml"));
    assert_eq!(records[0].get(FIELD_RETRIEVAL_DATE), Some("2017-06-01"));
  }

  #[tokio::test]
  async fn local_file_is_read_without_provenance() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rbd.xml");
    std::fs::write(
      &path,
      "<RBDSUCA language=\"swe\"><countryCode>SE</countryCode>\
       <RBD><euRBDCode>SE1</euRBDCode></RBD></RBDSUCA>",
    )
    .unwrap();

    let records = load_records(path.to_str().unwrap(), ImportKind::Rbd)
      .await
      .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].get("euRBDCode"), Some("SE1"));
    assert_eq!(records[0].get(FIELD_SOURCE_URL), None);
  }

  #[tokio::test]
  async fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.xml");
    let err = load_records(path.to_str().unwrap(), ImportKind::Rbd)
      .await
      .unwrap_err();
    assert!(matches!(err, Error::Io { .. }));
  }
}
