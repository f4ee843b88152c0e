//! Base Layouts - Fixed Template Contracts
//!
//! Each X-series layout is derived from one of five base templates. The
//! base template fixes the content area (title and footer chrome excluded)
//! and the series number that prefixes generated layout ids.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::geometry::{GeometryModel, PixelRect};
use crate::validation::ValidationError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseLayout {
    pub name: String,
    pub series: u8,
    pub description: String,
    pub content_area: PixelRect,
}

impl BaseLayout {
    fn new(name: &str, series: u8, description: &str, content_area: PixelRect) -> Self {
        Self {
            name: name.to_string(),
            series,
            description: description.to_string(),
            content_area,
        }
    }
}

/// Base layout registry - the five supported templates
#[derive(Debug, Clone)]
pub struct BaseLayoutRegistry {
    layouts: BTreeMap<String, BaseLayout>,
}

impl BaseLayoutRegistry {
    pub fn standard() -> Self {
        let layouts = [
            BaseLayout::new(
                "C1-text",
                1,
                "Full-width text content below the title band",
                PixelRect::new(60, 180, 1800, 840),
            ),
            BaseLayout::new(
                "I1-image-left",
                2,
                "Wide image on the left, content on the right",
                PixelRect::new(660, 180, 1200, 840),
            ),
            BaseLayout::new(
                "I2-image-right",
                3,
                "Content on the left, wide image on the right",
                PixelRect::new(60, 180, 1200, 840),
            ),
            BaseLayout::new(
                "I3-image-left-narrow",
                4,
                "Narrow image on the left, content on the right",
                PixelRect::new(420, 180, 1440, 840),
            ),
            BaseLayout::new(
                "I4-image-right-narrow",
                5,
                "Content on the left, narrow image on the right",
                PixelRect::new(60, 180, 1440, 840),
            ),
        ];

        Self {
            layouts: layouts.into_iter().map(|l| (l.name.clone(), l)).collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&BaseLayout> {
        self.layouts.get(name)
    }

    pub fn resolve(&self, name: &str) -> Result<&BaseLayout, ValidationError> {
        self.get(name)
            .ok_or_else(|| ValidationError::UnsupportedBaseLayout(name.to_string()))
    }

    /// All base layouts, ordered by series.
    pub fn list(&self) -> Vec<&BaseLayout> {
        let mut layouts: Vec<_> = self.layouts.values().collect();
        layouts.sort_by_key(|l| l.series);
        layouts
    }

    /// Names of base layouts whose content area does not fit the canvas.
    pub fn misfits(&self, geometry: &GeometryModel) -> Vec<&str> {
        let canvas = geometry.canvas();
        self.layouts
            .values()
            .filter(|l| l.content_area.is_empty() || !canvas.contains(&l.content_area))
            .map(|l| l.name.as_str())
            .collect()
    }
}

impl Default for BaseLayoutRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
