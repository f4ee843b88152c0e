//! Layout Engine - Single Entry Point
//!
//! Every generation resolves, validates and splits before the store is
//! touched. A request that fails any check leaves the store unchanged.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::binder::{BoundLayout, ContentBinder};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::identity::{normalize_content_type, LayoutIdentity, StructuralSpec};
use crate::layout::{DynamicLayout, CUSTOM_PATTERN};
use crate::patterns::{SplitPattern, SplitPatternLibrary};
use crate::split::{GridShape, SplitDirection, SplitSpec};
use crate::splitter::{ZoneAnnotations, ZoneSplitter};
use crate::store::{CreateOutcome, LayoutFilter, LayoutStore, StoreError};
use crate::templates::{BaseLayout, BaseLayoutRegistry};
use crate::validation::{check_zone_count, ValidationError};

#[cfg(feature = "test-hooks")]
use std::sync::atomic::{AtomicU32, Ordering};

#[cfg(feature = "test-hooks")]
static PREVIEW_CALL_COUNT: AtomicU32 = AtomicU32::new(0);

#[cfg(feature = "test-hooks")]
pub fn get_preview_call_count() -> u32 {
    PREVIEW_CALL_COUNT.load(Ordering::SeqCst)
}

#[cfg(feature = "test-hooks")]
pub fn reset_preview_call_count() {
    PREVIEW_CALL_COUNT.store(0, Ordering::SeqCst);
}

/// Zone count used when a custom request names neither a count nor ratios.
pub const DEFAULT_ZONE_COUNT: usize = 3;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub base_layout: String,
    pub content_type: String,
    #[serde(default)]
    pub zone_count: Option<usize>,
    #[serde(default)]
    pub split_direction: Option<SplitDirection>,
    #[serde(default)]
    pub split_pattern: Option<String>,
    #[serde(default)]
    pub zone_labels: Option<Vec<String>>,
    #[serde(default)]
    pub custom_ratios: Option<Vec<f64>>,
    #[serde(default)]
    pub content_type_hints: Option<Vec<String>>,
    #[serde(default)]
    pub grid_rows: Option<u32>,
    #[serde(default)]
    pub grid_columns: Option<u32>,
}

impl GenerateRequest {
    pub fn new(base_layout: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            base_layout: base_layout.into(),
            content_type: content_type.into(),
            ..Self::default()
        }
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.split_pattern = Some(pattern.into());
        self
    }

    pub fn with_direction(mut self, direction: SplitDirection) -> Self {
        self.split_direction = Some(direction);
        self
    }

    pub fn with_zone_count(mut self, zone_count: usize) -> Self {
        self.zone_count = Some(zone_count);
        self
    }

    pub fn with_ratios(mut self, ratios: Vec<f64>) -> Self {
        self.custom_ratios = Some(ratios);
        self
    }

    pub fn with_labels<I, L>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<String>,
    {
        self.zone_labels = Some(labels.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_hints<I, L>(mut self, hints: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<String>,
    {
        self.content_type_hints = Some(hints.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_grid(mut self, rows: u32, columns: u32) -> Self {
        self.grid_rows = Some(rows);
        self.grid_columns = Some(columns);
        self
    }

    fn grid_dims_given(&self) -> bool {
        self.grid_rows.is_some() || self.grid_columns.is_some()
    }
}

struct ResolvedRequest<'a> {
    base: &'a BaseLayout,
    content_type: String,
    pattern_name: String,
    spec: SplitSpec,
    annotations: ZoneAnnotations,
}

/// The layout engine - generation, lookup and binding over one store
pub struct LayoutEngine<S: LayoutStore> {
    store: S,
    splitter: ZoneSplitter,
    patterns: SplitPatternLibrary,
    base_layouts: BaseLayoutRegistry,
}

impl<S: LayoutStore> LayoutEngine<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            splitter: ZoneSplitter::default(),
            patterns: SplitPatternLibrary::standard(),
            base_layouts: BaseLayoutRegistry::standard(),
        }
    }

    pub fn with_config(store: S, config: &EngineConfig) -> Result<Self, EngineError> {
        let base_layouts = BaseLayoutRegistry::standard();
        config.validate(&base_layouts)?;
        Ok(Self {
            store,
            splitter: ZoneSplitter::new(config.geometry),
            patterns: SplitPatternLibrary::standard(),
            base_layouts,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Read-only pattern catalog
    pub fn patterns(&self) -> &SplitPatternLibrary {
        &self.patterns
    }

    pub fn pattern(&self, name: &str) -> Result<&SplitPattern, EngineError> {
        self.patterns
            .lookup(name)
            .map_err(|_| EngineError::PatternNotFound(name.to_string()))
    }

    /// The five supported base layouts, by series
    pub fn base_layouts(&self) -> Vec<&BaseLayout> {
        self.base_layouts.list()
    }

    /// Build the layout a request would produce without storing it.
    ///
    /// This is the ONLY path from request to record; `generate` goes through it.
    pub fn preview(&self, request: &GenerateRequest) -> Result<DynamicLayout, EngineError> {
        #[cfg(feature = "test-hooks")]
        PREVIEW_CALL_COUNT.fetch_add(1, Ordering::SeqCst);

        let resolved = self.resolve(request)?;
        let outcome = self.splitter.split(
            &resolved.base.content_area,
            &resolved.spec,
            &resolved.annotations,
        )?;

        let structural = StructuralSpec::new(
            &resolved.base.name,
            &resolved.content_type,
            &outcome.normalized,
        );
        let layout_id = LayoutIdentity::compute(resolved.base.series, &structural)?;
        debug!(
            layout_id = %layout_id,
            pattern = %resolved.pattern_name,
            direction = %outcome.normalized.direction,
            zones = outcome.zones.len(),
            "computed layout"
        );

        let now = Utc::now();
        Ok(DynamicLayout {
            layout_id,
            base_layout: resolved.base.name.clone(),
            content_type: resolved.content_type,
            split_pattern: resolved.pattern_name,
            split_direction: outcome.normalized.direction,
            zone_count: outcome.zones.len(),
            grid: outcome.normalized.grid,
            ratios: outcome.normalized.ratios(),
            zones: outcome.zones,
            content_area: resolved.base.content_area,
            reusable: true,
            created_at: now,
            updated_at: now,
            usage_count: 0,
        })
    }

    /// Generate a layout, reusing the stored record for an identical
    /// structural spec.
    pub fn generate(&self, request: &GenerateRequest) -> Result<DynamicLayout, EngineError> {
        let layout = self.preview(request)?;
        let layout_id = layout.layout_id.clone();

        match self.store.create(layout) {
            Ok(CreateOutcome::Created(layout)) => {
                info!(layout_id = %layout.layout_id, pattern = %layout.split_pattern, "created dynamic layout");
                Ok(layout)
            }
            Ok(CreateOutcome::Existing(layout)) => {
                info!(layout_id = %layout.layout_id, "reused existing dynamic layout");
                Ok(layout)
            }
            Err(StoreError::Collision(id)) => {
                error!(
                    layout_id = %id,
                    base_layout = %request.base_layout,
                    "layout id collision: stored record has a different structural spec"
                );
                Err(EngineError::IdentityCollision(id))
            }
            Err(err) => {
                debug!(layout_id = %layout_id, error = %err, "store rejected layout");
                Err(err.into())
            }
        }
    }

    pub fn get(&self, layout_id: &str) -> Result<DynamicLayout, EngineError> {
        LayoutIdentity::parse(layout_id)?;
        Ok(self.store.get(layout_id)?)
    }

    pub fn list(&self, filter: &LayoutFilter) -> Result<Vec<DynamicLayout>, EngineError> {
        let filter = LayoutFilter {
            content_type: filter.content_type.as_deref().map(normalize_content_type),
            base_layout: filter.base_layout.clone(),
        };
        Ok(self.store.list(&filter)?)
    }

    pub fn delete(&self, layout_id: &str) -> Result<(), EngineError> {
        LayoutIdentity::parse(layout_id)?;
        self.store.delete(layout_id)?;
        info!(layout_id = %layout_id, "deleted dynamic layout");
        Ok(())
    }

    /// Map slide content onto a stored layout's zones and count the use.
    pub fn bind(&self, layout_id: &str, content: &Value) -> Result<BoundLayout, EngineError> {
        LayoutIdentity::parse(layout_id)?;
        let layout = self.store.get(layout_id)?;
        let bound = ContentBinder::bind(&layout, content);

        // Usage counts are approximate; a failed bump never fails the bind
        match self.store.increment_usage(layout_id) {
            Ok(count) => debug!(layout_id = %layout_id, usage_count = count, "usage recorded"),
            Err(err) => warn!(layout_id = %layout_id, error = %err, "failed to record layout usage"),
        }
        Ok(bound)
    }

    fn resolve<'a>(&'a self, request: &GenerateRequest) -> Result<ResolvedRequest<'a>, EngineError> {
        if let Some(zone_count) = request.zone_count {
            check_zone_count(zone_count)?;
        }
        let content_type = normalize_content_type(&request.content_type);
        if content_type.is_empty() {
            return Err(ValidationError::EmptyContentType.into());
        }
        let base = self.base_layouts.resolve(&request.base_layout)?;

        let (pattern_name, spec, default_labels) = match request.split_pattern.as_deref() {
            Some(name) if name != CUSTOM_PATTERN => {
                let pattern = self.patterns.lookup(name)?;
                let spec = pattern_spec(pattern, request)?;
                (pattern.name.clone(), spec, pattern.default_labels.clone())
            }
            _ => (CUSTOM_PATTERN.to_string(), custom_spec(request)?, Vec::new()),
        };

        let zone_count = spec.zone_count();
        let mut labels = default_labels;
        if let Some(explicit) = &request.zone_labels {
            if explicit.len() > zone_count {
                warn!(given = explicit.len(), zone_count, "ignoring extra zone labels");
            }
            for (position, label) in explicit.iter().take(zone_count).enumerate() {
                if position < labels.len() {
                    labels[position] = label.clone();
                } else {
                    labels.push(label.clone());
                }
            }
        }
        let hints: Vec<String> = request
            .content_type_hints
            .iter()
            .flatten()
            .take(zone_count)
            .cloned()
            .collect();

        Ok(ResolvedRequest {
            base,
            content_type,
            pattern_name,
            spec,
            annotations: ZoneAnnotations::new(labels, hints),
        })
    }
}

fn pattern_spec(pattern: &SplitPattern, request: &GenerateRequest) -> Result<SplitSpec, EngineError> {
    if let Some(zone_count) = request.zone_count {
        if zone_count != pattern.zone_count() {
            return Err(ValidationError::ZoneCountMismatch {
                expected: pattern.zone_count(),
                actual: zone_count,
            }
            .into());
        }
    }
    if let Some(direction) = request.split_direction {
        if direction != pattern.direction() {
            return Err(ValidationError::DirectionMismatch {
                pattern: pattern.name.clone(),
                requested: direction,
                expected: pattern.direction(),
            }
            .into());
        }
    }
    if request.grid_dims_given() {
        if let Some(shape) = pattern.spec.grid_shape() {
            let rows_ok = request.grid_rows.map_or(true, |r| r == shape.rows);
            let columns_ok = request.grid_columns.map_or(true, |c| c == shape.columns);
            if !(rows_ok && columns_ok) {
                return Err(ValidationError::GridShapeMismatch {
                    rows: request.grid_rows.unwrap_or(shape.rows),
                    columns: request.grid_columns.unwrap_or(shape.columns),
                    zone_count: pattern.zone_count(),
                }
                .into());
            }
        }
    }

    match &request.custom_ratios {
        Some(ratios) => Ok(pattern.spec.with_ratios(ratios.clone())?),
        None => Ok(pattern.spec.clone()),
    }
}

fn custom_spec(request: &GenerateRequest) -> Result<SplitSpec, EngineError> {
    let direction = request.split_direction.unwrap_or(if request.grid_dims_given() {
        SplitDirection::Grid
    } else {
        SplitDirection::Horizontal
    });

    let spec = match direction {
        SplitDirection::Grid => SplitSpec::grid(grid_shape(request)?, None, None),
        _ => {
            if request.grid_dims_given() {
                warn!(direction = %direction, "grid rows/columns ignored for a non-grid split");
            }
            let zone_count = request
                .zone_count
                .or(request.custom_ratios.as_ref().map(Vec::len))
                .unwrap_or(DEFAULT_ZONE_COUNT);
            SplitSpec::equal(direction, zone_count, None)
        }
    };

    match &request.custom_ratios {
        Some(ratios) => Ok(spec.with_ratios(ratios.clone())?),
        None => Ok(spec),
    }
}

fn grid_shape(request: &GenerateRequest) -> Result<GridShape, EngineError> {
    let zone_count = request.zone_count;
    let mismatch = |rows: u32, columns: u32, zone_count: usize| {
        EngineError::from(ValidationError::GridShapeMismatch { rows, columns, zone_count })
    };

    let shape = match (request.grid_rows, request.grid_columns) {
        (Some(rows), Some(columns)) => GridShape::new(rows, columns),
        (Some(rows), None) => {
            let n = zone_count.unwrap_or(DEFAULT_ZONE_COUNT);
            if rows == 0 || n % rows as usize != 0 {
                return Err(mismatch(rows, 0, n));
            }
            GridShape::new(rows, (n / rows as usize) as u32)
        }
        (None, Some(columns)) => {
            let n = zone_count.unwrap_or(DEFAULT_ZONE_COUNT);
            if columns == 0 || n % columns as usize != 0 {
                return Err(mismatch(0, columns, n));
            }
            GridShape::new((n / columns as usize) as u32, columns)
        }
        (None, None) => GridShape::factorize(zone_count.unwrap_or(DEFAULT_ZONE_COUNT)),
    };

    // Shape must be bounded before any ratio vector is sized from it
    if shape.rows == 0 || shape.columns == 0 {
        return Err(mismatch(shape.rows, shape.columns, zone_count.unwrap_or(0)));
    }
    let cells = shape.rows as u64 * shape.columns as u64;
    if let Some(n) = zone_count {
        if n as u64 != cells {
            return Err(mismatch(shape.rows, shape.columns, n));
        }
    }
    check_zone_count(usize::try_from(cells).unwrap_or(usize::MAX))?;
    Ok(shape)
}

impl<S: LayoutStore + Default> Default for LayoutEngine<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}
