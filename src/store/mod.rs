//! Layout Store - Persistence Contract
//!
//! The engine only ever talks to [`LayoutStore`]. Creation is an atomic
//! compare-and-insert: an id that already exists with the same structural
//! spec yields the existing record, a differing spec is a collision.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::layout::DynamicLayout;

pub mod file;
pub mod memory;

pub use file::FileLayoutStore;
pub use memory::MemoryLayoutStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Layout not found: {0}")]
    NotFound(String),

    #[error("Layout id {0} already holds a different structural spec")]
    Collision(String),

    #[error("Layout store unavailable: {0}")]
    Unavailable(String),

    #[error("Stored layout {id} is unreadable: {reason}")]
    Corrupt { id: String, reason: String },
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub enum CreateOutcome {
    Created(DynamicLayout),
    Existing(DynamicLayout),
}

impl CreateOutcome {
    pub fn into_layout(self) -> DynamicLayout {
        match self {
            CreateOutcome::Created(layout) | CreateOutcome::Existing(layout) => layout,
        }
    }

    pub fn layout(&self) -> &DynamicLayout {
        match self {
            CreateOutcome::Created(layout) | CreateOutcome::Existing(layout) => layout,
        }
    }

    pub fn was_created(&self) -> bool {
        matches!(self, CreateOutcome::Created(_))
    }
}

/// Equality filters for [`LayoutStore::list`]; `None` matches anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutFilter {
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub base_layout: Option<String>,
}

impl LayoutFilter {
    pub fn matches(&self, layout: &DynamicLayout) -> bool {
        let content_ok = self
            .content_type
            .as_deref()
            .map_or(true, |ct| layout.content_type == ct);
        let base_ok = self
            .base_layout
            .as_deref()
            .map_or(true, |bl| layout.base_layout == bl);
        content_ok && base_ok
    }
}

pub trait LayoutStore: Send + Sync {
    /// Insert `layout` unless its id exists. Same spec → `Existing`,
    /// different spec → [`StoreError::Collision`].
    fn create(&self, layout: DynamicLayout) -> Result<CreateOutcome, StoreError>;

    fn get(&self, layout_id: &str) -> Result<DynamicLayout, StoreError>;

    /// Matching layouts sorted by id.
    fn list(&self, filter: &LayoutFilter) -> Result<Vec<DynamicLayout>, StoreError>;

    fn delete(&self, layout_id: &str) -> Result<(), StoreError>;

    /// Bump `usage_count`, returning the new value.
    fn increment_usage(&self, layout_id: &str) -> Result<u64, StoreError>;
}

impl<S: LayoutStore + ?Sized> LayoutStore for Arc<S> {
    fn create(&self, layout: DynamicLayout) -> Result<CreateOutcome, StoreError> {
        (**self).create(layout)
    }

    fn get(&self, layout_id: &str) -> Result<DynamicLayout, StoreError> {
        (**self).get(layout_id)
    }

    fn list(&self, filter: &LayoutFilter) -> Result<Vec<DynamicLayout>, StoreError> {
        (**self).list(filter)
    }

    fn delete(&self, layout_id: &str) -> Result<(), StoreError> {
        (**self).delete(layout_id)
    }

    fn increment_usage(&self, layout_id: &str) -> Result<u64, StoreError> {
        (**self).increment_usage(layout_id)
    }
}

/// Shared compare step for [`LayoutStore::create`] implementations.
pub(crate) fn resolve_existing(
    existing: DynamicLayout,
    incoming: &DynamicLayout,
) -> Result<CreateOutcome, StoreError> {
    if existing.structural_spec() == incoming.structural_spec() {
        Ok(CreateOutcome::Existing(existing))
    } else {
        Err(StoreError::Collision(incoming.layout_id.clone()))
    }
}
