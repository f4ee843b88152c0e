//! Split Pattern Library
//!
//! Named, pre-validated split specs. The library is an immutable value
//! built once at startup and handed out by reference.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::split::{GridShape, SplitDirection, SplitSpec};
use crate::validation::{SpecValidator, ValidationError};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplitPattern {
    pub name: String,
    pub description: String,
    pub spec: SplitSpec,
    pub default_labels: Vec<String>,
}

impl SplitPattern {
    pub fn new(name: &str, description: &str, spec: SplitSpec, labels: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            spec,
            default_labels: labels.iter().map(|l| l.to_string()).collect(),
        }
    }

    pub fn direction(&self) -> SplitDirection {
        self.spec.direction()
    }

    pub fn zone_count(&self) -> usize {
        self.spec.zone_count()
    }
}

#[derive(Debug, Clone)]
pub struct SplitPatternLibrary {
    patterns: BTreeMap<String, SplitPattern>,
}

impl SplitPatternLibrary {
    /// Build a library, rejecting any entry that fails split validation or
    /// carries the wrong number of default labels.
    pub fn try_new(patterns: Vec<SplitPattern>) -> Result<Self, ValidationError> {
        let validator = SpecValidator::new();
        let mut map = BTreeMap::new();
        for pattern in patterns {
            validator.validate(&pattern.spec)?;
            if pattern.default_labels.len() != pattern.zone_count() {
                return Err(ValidationError::ZoneCountMismatch {
                    expected: pattern.zone_count(),
                    actual: pattern.default_labels.len(),
                });
            }
            map.insert(pattern.name.clone(), pattern);
        }
        Ok(Self { patterns: map })
    }

    /// The ten canonical patterns.
    ///
    /// # Panics
    /// Only if the built-in catalog itself is malformed, which the unit
    /// tests rule out.
    pub fn standard() -> Self {
        match Self::try_new(standard_patterns()) {
            Ok(library) => library,
            Err(err) => panic!("built-in split pattern catalog is invalid: {err}"),
        }
    }

    pub fn lookup(&self, name: &str) -> Result<&SplitPattern, ValidationError> {
        self.patterns
            .get(name)
            .ok_or_else(|| ValidationError::UnknownPattern(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &SplitPattern> {
        self.patterns.values()
    }

    pub fn names(&self) -> Vec<&str> {
        self.patterns.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl Default for SplitPatternLibrary {
    fn default() -> Self {
        Self::standard()
    }
}

fn standard_patterns() -> Vec<SplitPattern> {
    use SplitDirection::{Horizontal, Vertical};

    vec![
        SplitPattern::new(
            "agenda-3-item",
            "Three stacked agenda items of equal height",
            SplitSpec::equal(Horizontal, 3, None),
            &["Item 1", "Item 2", "Item 3"],
        ),
        SplitPattern::new(
            "hero-2row",
            "Large statement band over a supporting band",
            SplitSpec::Horizontal { ratios: vec![0.6, 0.4] },
            &["Hero", "Supporting"],
        ),
        SplitPattern::new(
            "use-case-3row",
            "Short problem row followed by two detail rows",
            SplitSpec::Horizontal { ratios: vec![0.2, 0.4, 0.4] },
            &["Challenge", "Solution", "Outcome"],
        ),
        SplitPattern::new(
            "timeline-4row",
            "Four equal milestone rows",
            SplitSpec::equal(Horizontal, 4, None),
            &["Phase 1", "Phase 2", "Phase 3", "Phase 4"],
        ),
        SplitPattern::new(
            "comparison-2col",
            "Two equal columns for side-by-side comparison",
            SplitSpec::equal(Vertical, 2, None),
            &["Option A", "Option B"],
        ),
        SplitPattern::new(
            "sidebar-2col",
            "Narrow sidebar next to a main column",
            SplitSpec::Vertical { ratios: vec![0.3, 0.7] },
            &["Sidebar", "Main"],
        ),
        SplitPattern::new(
            "comparison-3col",
            "Three equal columns",
            SplitSpec::equal(Vertical, 3, None),
            &["Option A", "Option B", "Option C"],
        ),
        SplitPattern::new(
            "grid-2x2",
            "Four quadrants",
            SplitSpec::grid(GridShape::new(2, 2), None, None),
            &["Top Left", "Top Right", "Bottom Left", "Bottom Right"],
        ),
        SplitPattern::new(
            "grid-2x3",
            "Two rows of three cards",
            SplitSpec::grid(GridShape::new(2, 3), None, None),
            &["Card 1", "Card 2", "Card 3", "Card 4", "Card 5", "Card 6"],
        ),
        SplitPattern::new(
            "grid-3x2",
            "Three rows of two cards",
            SplitSpec::grid(GridShape::new(3, 2), None, None),
            &["Card 1", "Card 2", "Card 3", "Card 4", "Card 5", "Card 6"],
        ),
    ]
}
