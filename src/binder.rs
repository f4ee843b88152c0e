//! Content Binder - Slide Content -> Generated Zones
//!
//! Lookup order per zone, first hit wins:
//! 1. `content.zones[<zone_id>]`
//! 2. the zone's 0-based position: `content.zones[i]` (array) or
//!    `content.zones["i"]` (object)
//! 3. top-level `content["zone_<i+1>"]`
//!
//! A zone with no match is bound to empty content. Binding never fails.

use serde::Serialize;
use serde_json::Value;

use crate::geometry::{GridRange, PixelRect};
use crate::layout::{DynamicLayout, Zone};

const ZONES_KEY: &str = "zones";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingSource {
    ZoneId,
    Position,
    TopLevelKey,
    Empty,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneBinding {
    pub zone_id: String,
    pub label: String,
    pub grid: GridRange,
    pub pixels: PixelRect,
    pub z_index: u32,
    pub content_type_hint: String,
    pub content: Option<Value>,
    pub source: BindingSource,
}

impl ZoneBinding {
    pub fn is_empty(&self) -> bool {
        self.content.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundLayout {
    pub layout_id: String,
    pub base_layout: String,
    pub bindings: Vec<ZoneBinding>,
}

impl BoundLayout {
    pub fn binding(&self, zone_id: &str) -> Option<&ZoneBinding> {
        self.bindings.iter().find(|b| b.zone_id == zone_id)
    }

    pub fn bound_count(&self) -> usize {
        self.bindings.iter().filter(|b| !b.is_empty()).count()
    }

    pub fn unbound_zone_ids(&self) -> Vec<&str> {
        self.bindings
            .iter()
            .filter(|b| b.is_empty())
            .map(|b| b.zone_id.as_str())
            .collect()
    }
}

pub struct ContentBinder;

impl ContentBinder {
    pub fn bind(layout: &DynamicLayout, content: &Value) -> BoundLayout {
        let bindings = layout
            .zones
            .iter()
            .enumerate()
            .map(|(position, zone)| {
                let (content, source) = match resolve(content, zone, position) {
                    Some((value, source)) => (Some(value.clone()), source),
                    None => (None, BindingSource::Empty),
                };
                ZoneBinding {
                    zone_id: zone.zone_id.clone(),
                    label: zone.label.clone(),
                    grid: zone.grid,
                    pixels: zone.pixels,
                    z_index: zone.z_index,
                    content_type_hint: zone.content_type_hint.clone(),
                    content,
                    source,
                }
            })
            .collect::<Vec<_>>();

        tracing::debug!(
            layout_id = %layout.layout_id,
            bound = bindings.iter().filter(|b| !b.is_empty()).count(),
            zones = bindings.len(),
            "bound slide content"
        );

        BoundLayout {
            layout_id: layout.layout_id.clone(),
            base_layout: layout.base_layout.clone(),
            bindings,
        }
    }
}

fn resolve<'a>(content: &'a Value, zone: &Zone, position: usize) -> Option<(&'a Value, BindingSource)> {
    let zones = content.get(ZONES_KEY);

    if let Some(value) = zones.and_then(|z| z.as_object()).and_then(|m| m.get(&zone.zone_id)) {
        return Some((value, BindingSource::ZoneId));
    }

    let by_position = match zones {
        Some(Value::Array(items)) => items.get(position),
        Some(Value::Object(map)) => map.get(&position.to_string()),
        _ => None,
    };
    if let Some(value) = by_position {
        return Some((value, BindingSource::Position));
    }

    content
        .get(Zone::zone_id_for(position))
        .map(|value| (value, BindingSource::TopLevelKey))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::PixelRect;
    use crate::split::SplitSpec;
    use crate::splitter::{ZoneAnnotations, ZoneSplitter};
    use chrono::Utc;
    use serde_json::json;

    fn three_zone_layout() -> DynamicLayout {
        let area = PixelRect::new(60, 180, 1800, 840);
        let spec = SplitSpec::Horizontal { ratios: vec![0.35, 0.35, 0.30] };
        let out = ZoneSplitter::default()
            .split(&area, &spec, &ZoneAnnotations::default())
            .unwrap();
        let now = Utc::now();
        DynamicLayout {
            layout_id: "X1-0123abcd".into(),
            base_layout: "C1-text".into(),
            content_type: "bullets".into(),
            split_pattern: "custom".into(),
            split_direction: out.normalized.direction,
            zone_count: 3,
            grid: None,
            ratios: out.normalized.ratios(),
            zones: out.zones,
            content_area: area,
            reusable: true,
            created_at: now,
            updated_at: now,
            usage_count: 0,
        }
    }

    #[test]
    fn test_top_level_zone_key() {
        let layout = three_zone_layout();
        let bound = ContentBinder::bind(&layout, &json!({"zone_2": "<p>x</p>"}));

        let zone_2 = bound.binding("zone_2").unwrap();
        assert_eq!(zone_2.content, Some(json!("<p>x</p>")));
        assert_eq!(zone_2.source, BindingSource::TopLevelKey);
        assert_eq!(bound.unbound_zone_ids(), vec!["zone_1", "zone_3"]);
    }

    #[test]
    fn test_zone_id_beats_position_and_top_level() {
        let layout = three_zone_layout();
        let content = json!({
            "zones": {"zone_1": "by id", "0": "by position"},
            "zone_1": "top level"
        });
        let bound = ContentBinder::bind(&layout, &content);
        let zone_1 = bound.binding("zone_1").unwrap();
        assert_eq!(zone_1.content, Some(json!("by id")));
        assert_eq!(zone_1.source, BindingSource::ZoneId);
    }

    #[test]
    fn test_positional_array() {
        let layout = three_zone_layout();
        let content = json!({"zones": ["first", {"html": "second"}], "zone_3": "third"});
        let bound = ContentBinder::bind(&layout, &content);

        assert_eq!(bound.bindings[0].content, Some(json!("first")));
        assert_eq!(bound.bindings[1].source, BindingSource::Position);
        assert_eq!(bound.bindings[2].source, BindingSource::TopLevelKey);
        assert_eq!(bound.bound_count(), 3);
    }

    #[test]
    fn test_non_object_content_binds_empty() {
        let layout = three_zone_layout();
        let bound = ContentBinder::bind(&layout, &json!("just a string"));
        assert_eq!(bound.bound_count(), 0);
        assert!(bound.bindings.iter().all(|b| b.source == BindingSource::Empty));
    }
}
