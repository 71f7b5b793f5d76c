//! Streaming parser for `RBDSUCA` and `SWB` report documents.
//!
//! The reports are shallow: a root element carrying document-level
//! attributes and fields, followed by one element per reported entity.
//! Every leaf element inside an entity becomes a field named after its local
//! name; leaves outside any entity are document-level fields shared by all
//! records.

use quick_xml::{
  Reader,
  events::{BytesStart, Event},
};
use tracing::debug;
use wfd_core::{config::ImportKind, record::HarvestedRecord, store::RecordParser};

use crate::error::{Error, Result};

type Fields = Vec<(String, String)>;

/// Parses the report document for one import kind.
#[derive(Debug, Clone, Copy)]
pub struct ReportParser {
  kind: ImportKind,
}

impl ReportParser {
  pub fn new(kind: ImportKind) -> Self { Self { kind } }

  fn root_element(&self) -> &'static str {
    match self.kind {
      ImportKind::Rbd => "RBDSUCA",
      ImportKind::Swb => "SWB",
    }
  }

  fn record_element(&self) -> &'static str {
    match self.kind {
      ImportKind::Rbd => "RBD",
      ImportKind::Swb => "SurfaceWaterBody",
    }
  }
}

impl RecordParser for ReportParser {
  type Error = Error;

  fn parse(&self, input: &[u8]) -> Result<Vec<HarvestedRecord>> {
    let mut reader = Reader::from_reader(input);
    reader.config_mut().trim_text(true);

    let mut header: Fields = Vec::new();
    let mut entities: Vec<Fields> = Vec::new();
    // Fields of the entity being read and the depth it was opened at.
    let mut current: Option<(Fields, usize)> = None;
    // The innermost open element, while it has no child elements yet.
    let mut leaf: Option<(String, String)> = None;
    let mut depth = 0usize;
    let mut seen_root = false;
    let mut buf = Vec::new();

    loop {
      match reader.read_event_into(&mut buf) {
        Ok(Event::Start(ref e)) => {
          depth += 1;
          let name = element_name(e);
          if depth == 1 {
            self.check_root(&name)?;
            seen_root = true;
            header.extend(attributes(e)?);
          } else if current.is_none() && name == self.record_element() {
            current = Some((attributes(e)?, depth));
          }
          leaf = Some((name, String::new()));
        }
        Ok(Event::Empty(ref e)) => {
          let name = element_name(e);
          if depth == 0 {
            self.check_root(&name)?;
            seen_root = true;
            header.extend(attributes(e)?);
          } else if current.is_none() && name == self.record_element() {
            entities.push(attributes(e)?);
          }
          leaf = None;
        }
        Ok(Event::Text(ref e)) => {
          if let Some((_, text)) = leaf.as_mut() {
            let unescaped = e.unescape().map_err(|e| Error::Xml(e.to_string()))?;
            text.push_str(&unescaped);
          }
        }
        Ok(Event::CData(ref e)) => {
          if let Some((_, text)) = leaf.as_mut() {
            text.push_str(&String::from_utf8_lossy(e));
          }
        }
        Ok(Event::End(_)) => {
          if let Some((name, text)) = leaf.take()
            && !text.trim().is_empty()
          {
            let field = (name, text.trim().to_string());
            match current.as_mut() {
              Some((fields, _)) => fields.push(field),
              None => header.push(field),
            }
          }
          if current.as_ref().is_some_and(|(_, opened)| *opened == depth)
            && let Some((fields, _)) = current.take()
          {
            entities.push(fields);
          }
          depth = depth.saturating_sub(1);
        }
        Ok(Event::Eof) => break,
        Err(e) => return Err(Error::Xml(e.to_string())),
        _ => {}
      }
      buf.clear();
    }

    if !seen_root {
      return Err(Error::NoRoot);
    }

    debug!(
      kind = %self.kind,
      records = entities.len(),
      document_fields = header.len(),
      "parsed report document"
    );
    Ok(
      entities
        .into_iter()
        .map(|fields| header.iter().cloned().chain(fields).collect())
        .collect(),
    )
  }
}

impl ReportParser {
  fn check_root(&self, found: &str) -> Result<()> {
    if found == self.root_element() {
      Ok(())
    } else {
      Err(Error::UnexpectedRoot {
        expected: self.root_element(),
        found:    found.to_string(),
      })
    }
  }
}

fn local_name(name: &[u8]) -> &[u8] {
  // strip "prefix:" if present
  if let Some(pos) = name.iter().rposition(|&b| b == b':') {
    &name[pos + 1..]
  } else {
    name
  }
}

fn element_name(e: &BytesStart<'_>) -> String {
  String::from_utf8_lossy(local_name(e.name().as_ref())).into_owned()
}

/// Attributes as `@name` fields; namespace declarations are dropped.
fn attributes(e: &BytesStart<'_>) -> Result<Fields> {
  let mut fields = Vec::new();
  for attr in e.attributes() {
    let attr = attr.map_err(|e| Error::Xml(e.to_string()))?;
    let key = attr.key.as_ref();
    if key.starts_with(b"xmlns") {
      continue;
    }
    let value = attr
      .unescape_value()
      .map_err(|e| Error::Xml(e.to_string()))?;
    fields.push((
      format!("@{}", String::from_utf8_lossy(local_name(key))),
      value.into_owned(),
    ));
  }
  Ok(fields)
}

#[cfg(test)]
mod tests {
  use wfd_core::record::{FIELD_CREATION_DATE, FIELD_LANGUAGE};

  use super::*;

  const RBD_DOC: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<RBDSUCA xmlns="http://water.eionet.europa.eu/schemas/dir200060ec"
         xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
         language="swe" creationDate="2016-03-22T10:15:00">
  <countryCode>SE</countryCode>
  <RBD>
    <euRBDCode>SE1</euRBDCode>
    <rbdName>Bottenviken</rbdName>
    <primeCompetentAuthority>SE1</primeCompetentAuthority>
    <rbdArea>151 000</rbdArea>
    <internationalRBD>Yes</internationalRBD>
  </RBD>
  <RBD>
    <euRBDCode>SE5</euRBDCode>
    <rbdName>V&#228;sterhavet</rbdName>
    <nationalRBDName><![CDATA[Västerhavets vattendistrikt]]></nationalRBDName>
    <primeCompetentAuthority>SE5</primeCompetentAuthority>
    <internationalRBD/>
  </RBD>
</RBDSUCA>"#;

  const SWB_DOC: &str = r#"<SWB language="swe" creationDate="2016-03-22">
  <countryCode>SE</countryCode>
  <euRBDCode>SE1</euRBDCode>
  <SurfaceWaterBody>
    <euSurfaceWaterBodyCode>SE655587-158869</euSurfaceWaterBodyCode>
    <surfaceWaterBodyName>Ivösjön</surfaceWaterBodyName>
    <surfaceWaterBodyCategory>LW</surfaceWaterBodyCategory>
    <swSignificantImpacts>
      <swSignificantImpactType>NUTR - Nutrient pollution</swSignificantImpactType>
      <swSignificantImpactType>CHEM - Chemical pollution</swSignificantImpactType>
    </swSignificantImpacts>
  </SurfaceWaterBody>
  <SurfaceWaterBody>
    <euSurfaceWaterBodyCode>SE656324-154110</euSurfaceWaterBodyCode>
    <surfaceWaterBodyCategory>RW</surfaceWaterBodyCategory>
  </SurfaceWaterBody>
</SWB>"#;

  fn parse(kind: ImportKind, doc: &str) -> Result<Vec<HarvestedRecord>> {
    ReportParser::new(kind).parse(doc.as_bytes())
  }

  #[test]
  fn rbd_document_yields_one_record_per_district() {
    let records = parse(ImportKind::Rbd, RBD_DOC).unwrap();
    assert_eq!(records.len(), 2);

    let first = &records[0];
    assert_eq!(first.get(FIELD_LANGUAGE), Some("swe"));
    assert_eq!(first.get(FIELD_CREATION_DATE), Some("2016-03-22T10:15:00"));
    assert_eq!(first.get("countryCode"), Some("SE"));
    assert_eq!(first.get("euRBDCode"), Some("SE1"));
    assert_eq!(first.get("rbdArea"), Some("151 000"));
    assert_eq!(first.get("schemaLocation"), None);

    let second = &records[1];
    assert_eq!(second.get("rbdName"), Some("Västerhavet"));
    assert_eq!(
      second.get("nationalRBDName"),
      Some("Västerhavets vattendistrikt")
    );
    assert_eq!(second.get("internationalRBD"), None);
    assert_eq!(second.get("rbdArea"), None);
  }

  #[test]
  fn document_fields_come_before_entity_fields() {
    let records = parse(ImportKind::Swb, SWB_DOC).unwrap();
    let names: Vec<&str> = records[1].fields().map(|(name, _)| name).collect();
    assert_eq!(names, vec![
      "@language",
      "@creationDate",
      "countryCode",
      "euRBDCode",
      "euSurfaceWaterBodyCode",
      "surfaceWaterBodyCategory",
    ]);
  }

  #[test]
  fn nested_and_repeated_leaves_are_flattened() {
    let records = parse(ImportKind::Swb, SWB_DOC).unwrap();
    let impacts: Vec<&str> =
      records[0].get_all("swSignificantImpactType").collect();
    assert_eq!(impacts, vec![
      "NUTR - Nutrient pollution",
      "CHEM - Chemical pollution"
    ]);
    assert_eq!(records[0].get("swSignificantImpacts"), None);
  }

  #[test]
  fn wrong_document_kind_is_rejected() {
    let err = parse(ImportKind::Swb, RBD_DOC).unwrap_err();
    assert!(matches!(
      err,
      Error::UnexpectedRoot { expected: "SWB", ref found } if found == "RBDSUCA"
    ));
  }

  #[test]
  fn empty_input_has_no_root() {
    assert!(matches!(parse(ImportKind::Rbd, "").unwrap_err(), Error::NoRoot));
  }

  #[test]
  fn malformed_xml_is_an_error() {
    let err = parse(ImportKind::Rbd, "<RBDSUCA><RBD></RBDSUCA>").unwrap_err();
    assert!(matches!(err, Error::Xml(_)));
  }

  #[test]
  fn parsing_is_repeatable() {
    let parser = ReportParser::new(ImportKind::Rbd);
    assert_eq!(
      parser.parse(RBD_DOC.as_bytes()).unwrap(),
      parser.parse(RBD_DOC.as_bytes()).unwrap()
    );
  }
}
