//! In-memory layout store.

use chrono::Utc;
use parking_lot::RwLock;
use std::collections::BTreeMap;

use super::{resolve_existing, CreateOutcome, LayoutFilter, LayoutStore, StoreError};
use crate::layout::DynamicLayout;

#[derive(Debug, Default)]
pub struct MemoryLayoutStore {
    layouts: RwLock<BTreeMap<String, DynamicLayout>>,
}

impl MemoryLayoutStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.layouts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.layouts.read().is_empty()
    }
}

impl LayoutStore for MemoryLayoutStore {
    fn create(&self, layout: DynamicLayout) -> Result<CreateOutcome, StoreError> {
        // Compare and insert under one write lock
        let mut layouts = self.layouts.write();
        if let Some(existing) = layouts.get(&layout.layout_id) {
            return resolve_existing(existing.clone(), &layout);
        }
        layouts.insert(layout.layout_id.clone(), layout.clone());
        Ok(CreateOutcome::Created(layout))
    }

    fn get(&self, layout_id: &str) -> Result<DynamicLayout, StoreError> {
        self.layouts
            .read()
            .get(layout_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(layout_id.to_string()))
    }

    fn list(&self, filter: &LayoutFilter) -> Result<Vec<DynamicLayout>, StoreError> {
        Ok(self
            .layouts
            .read()
            .values()
            .filter(|l| filter.matches(l))
            .cloned()
            .collect())
    }

    fn delete(&self, layout_id: &str) -> Result<(), StoreError> {
        self.layouts
            .write()
            .remove(layout_id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(layout_id.to_string()))
    }

    fn increment_usage(&self, layout_id: &str) -> Result<u64, StoreError> {
        let mut layouts = self.layouts.write();
        let layout = layouts
            .get_mut(layout_id)
            .ok_or_else(|| StoreError::NotFound(layout_id.to_string()))?;
        layout.usage_count += 1;
        layout.updated_at = Utc::now();
        Ok(layout.usage_count)
    }
}
