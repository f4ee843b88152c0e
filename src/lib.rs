//! X-Series Core - Dynamic Layout Zone Engine
//!
//! # Guarantees
//! 1. Zones Tile Exactly (no gaps, no overlaps, remainder on the last zone)
//! 2. Ids Are Content-Addressed (same structure, same id)
//! 3. Validation Precedes Storage
//! 4. Records Are Immutable (structural change means a new id)
//! 5. Binding Never Fails on Content

pub mod binder;
pub mod config;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod hashing;
pub mod identity;
pub mod layout;
pub mod logging;
pub mod patterns;
pub mod split;
pub mod splitter;
pub mod store;
pub mod templates;
pub mod validation;

pub use binder::{BindingSource, BoundLayout, ContentBinder, ZoneBinding};
pub use config::EngineConfig;
pub use engine::{GenerateRequest, LayoutEngine};
pub use error::{EngineError, ErrorReport, ErrorStatus};
pub use geometry::{GeometryModel, GridRange, PixelRect};
pub use identity::{LayoutIdentity, StructuralSpec};
pub use layout::{DynamicLayout, Zone};
pub use patterns::{SplitPattern, SplitPatternLibrary};
pub use split::{GridShape, SplitDirection, SplitSpec};
pub use splitter::{ZoneAnnotations, ZoneSplitter, Z_INDEX_BASE};
pub use store::{FileLayoutStore, LayoutFilter, LayoutStore, MemoryLayoutStore};
pub use templates::{BaseLayout, BaseLayoutRegistry};
pub use validation::ValidationError;

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
