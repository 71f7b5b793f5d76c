//! Well-known properties and items of the target knowledge base.

use crate::entity::{EntityId, PropertyId};

// ─── Statement properties ────────────────────────────────────────────────────

pub const INSTANCE_OF: PropertyId = PropertyId::new(31);
pub const COUNTRY: PropertyId = PropertyId::new(17);
pub const OPERATOR: PropertyId = PropertyId::new(137);
pub const PART_OF: PropertyId = PropertyId::new(361);
pub const AREA: PropertyId = PropertyId::new(2046);
/// EU river basin district code (`euRBDCode`).
pub const EU_RBD_CODE: PropertyId = PropertyId::new(2965);
/// EU surface water body code (`euSurfaceWaterBodyCode`).
pub const EU_SWB_CODE: PropertyId = PropertyId::new(2856);
pub const SIGNIFICANT_IMPACT: PropertyId = PropertyId::new(3643);
pub const ECOLOGICAL_STATUS: PropertyId = PropertyId::new(4002);

// ─── Qualifier and reference properties ──────────────────────────────────────

pub const POINT_IN_TIME: PropertyId = PropertyId::new(585);
pub const STATED_IN: PropertyId = PropertyId::new(248);
pub const REFERENCE_URL: PropertyId = PropertyId::new(854);
pub const PUBLICATION_DATE: PropertyId = PropertyId::new(577);
pub const RETRIEVED: PropertyId = PropertyId::new(813);

// ─── Items ───────────────────────────────────────────────────────────────────

pub const RIVER_BASIN_DISTRICT: EntityId = EntityId::new(132017);
pub const SQUARE_KILOMETRE: EntityId = EntityId::new(712226);
