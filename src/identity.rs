//! Layout Identity - Content-Addressed Ids
//!
//! `layout_id = "X{series}-{hash8}"`, where `hash8` covers only the
//! structural spec. Labels, hints, pattern names and timestamps never
//! reach the hash, so re-labelled requests reuse the same record.

use serde::{Deserialize, Serialize};

use crate::hashing::short_hash;
use crate::split::{NormalizedSplit, SplitDirection};
use crate::validation::ValidationError;

pub const LAYOUT_ID_PREFIX: char = 'X';
pub const HASH_LEN: usize = 8;
pub const MIN_SERIES: u8 = 1;
pub const MAX_SERIES: u8 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StructuralSpec {
    pub base_layout: String,
    pub content_type: String,
    pub direction: SplitDirection,
    pub zone_count: usize,
    pub grid_rows: Option<u32>,
    pub grid_columns: Option<u32>,
    pub ratios_bp: Vec<u32>,
}

impl StructuralSpec {
    pub fn new(base_layout: &str, content_type: &str, split: &NormalizedSplit) -> Self {
        Self {
            base_layout: base_layout.to_string(),
            content_type: normalize_content_type(content_type),
            direction: split.direction,
            zone_count: split.zone_count(),
            grid_rows: split.grid.map(|g| g.rows),
            grid_columns: split.grid.map(|g| g.columns),
            ratios_bp: split.ratios_bp.clone(),
        }
    }
}

pub fn normalize_content_type(content_type: &str) -> String {
    content_type.trim().to_lowercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedLayoutId<'a> {
    pub series: u8,
    pub hash: &'a str,
}

pub struct LayoutIdentity;

impl LayoutIdentity {
    pub fn compute(series: u8, spec: &StructuralSpec) -> Result<String, serde_json::Error> {
        let hash = short_hash(spec, HASH_LEN)?;
        Ok(format!("{LAYOUT_ID_PREFIX}{series}-{hash}"))
    }

    /// Check an id against `^X[1-5]-[0-9a-f]{8}$`.
    pub fn parse(layout_id: &str) -> Result<ParsedLayoutId<'_>, ValidationError> {
        let invalid = || ValidationError::InvalidLayoutId(layout_id.to_string());

        let rest = layout_id.strip_prefix(LAYOUT_ID_PREFIX).ok_or_else(invalid)?;
        let (series, hash) = rest.split_once('-').ok_or_else(invalid)?;

        let series: u8 = match series.as_bytes() {
            [digit @ b'0'..=b'9'] => digit - b'0',
            _ => return Err(invalid()),
        };
        if !(MIN_SERIES..=MAX_SERIES).contains(&series) {
            return Err(invalid());
        }

        let hex_ok = hash.len() == HASH_LEN
            && hash.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if !hex_ok {
            return Err(invalid());
        }

        Ok(ParsedLayoutId { series, hash })
    }

    pub fn is_valid(layout_id: &str) -> bool {
        Self::parse(layout_id).is_ok()
    }
}
