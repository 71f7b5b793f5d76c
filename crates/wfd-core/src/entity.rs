//! Knowledge-base identifiers and entity resolution outcomes.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

// ─── Identifiers ─────────────────────────────────────────────────────────────

/// An item identifier in the target knowledge base, e.g. `Q132017`.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
  Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct EntityId(u64);

impl EntityId {
  pub const fn new(number: u64) -> Self { Self(number) }

  pub fn number(self) -> u64 { self.0 }
}

impl fmt::Display for EntityId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Q{}", self.0)
  }
}

impl FromStr for EntityId {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    parse_prefixed(s, 'Q')
      .map(Self)
      .ok_or_else(|| Error::InvalidEntityId(s.to_string()))
  }
}

impl TryFrom<String> for EntityId {
  type Error = Error;

  fn try_from(s: String) -> Result<Self, Self::Error> { s.parse() }
}

impl From<EntityId> for String {
  fn from(id: EntityId) -> Self { id.to_string() }
}

/// A property identifier in the target knowledge base, e.g. `P31`.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
  Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct PropertyId(u32);

impl PropertyId {
  pub const fn new(number: u32) -> Self { Self(number) }

  pub fn number(self) -> u32 { self.0 }
}

impl fmt::Display for PropertyId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "P{}", self.0)
  }
}

impl FromStr for PropertyId {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    parse_prefixed(s, 'P')
      .and_then(|n| u32::try_from(n).ok())
      .map(Self)
      .ok_or_else(|| Error::InvalidPropertyId(s.to_string()))
  }
}

impl TryFrom<String> for PropertyId {
  type Error = Error;

  fn try_from(s: String) -> Result<Self, Self::Error> { s.parse() }
}

impl From<PropertyId> for String {
  fn from(id: PropertyId) -> Self { id.to_string() }
}

/// Parse `<prefix><digits>` where the number is non-zero.
fn parse_prefixed(s: &str, prefix: char) -> Option<u64> {
  let digits = s.strip_prefix(prefix)?;
  if digits.is_empty() || digits.starts_with('0') {
    return None;
  }
  if !digits.bytes().all(|b| b.is_ascii_digit()) {
    return None;
  }
  digits.parse().ok()
}

// ─── Resolution ──────────────────────────────────────────────────────────────

/// Whether a run may create entities that do not exist yet.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum CreationPolicy {
  AllowCreate,
  /// Only enrich entities that already exist.
  #[default]
  EnrichOnly,
}

/// The entity a write plan applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Target {
  Existing(EntityId),
  /// No identifier yet; one is assigned by the writer on creation.
  New,
}

impl Target {
  pub fn entity_id(&self) -> Option<EntityId> {
    match self {
      Self::Existing(id) => Some(*id),
      Self::New => None,
    }
  }
}

/// The outcome of resolving a unique code against the knowledge base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
  Existing(EntityId),
  New,
  /// No match and the policy forbids creation; the record is left out.
  Skip,
}

impl Resolution {
  /// The write target, or `None` for [`Resolution::Skip`].
  pub fn target(self) -> Option<Target> {
    match self {
      Self::Existing(id) => Some(Target::Existing(id)),
      Self::New => Some(Target::New),
      Self::Skip => None,
    }
  }
}
