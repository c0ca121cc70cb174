//! Schema inference for schemaless collections
//!
//! - [`resolver`]: column type resolution for SQL exports
//! - [`sampler`]: bounded document samples
//! - [`scan`]: per-collection field type labels
//! - [`relations`]: foreign-key guesses between collections
//! - [`layout`]: entity diagram placement and DOT rendering

pub mod layout;
pub mod relations;
pub mod resolver;
pub mod sampler;
pub mod scan;

pub use layout::{DiagramLayout, EntityBox, layout_schema, to_dot};
pub use relations::{LinkTarget, RelationshipEdge, infer_relationships, resolve_link};
pub use resolver::{ColumnType, FieldTypeCollector, FieldTypeSet, Kind, ResolvedColumn, resolve};
pub use sampler::{DocumentSampler, SampleMode};
pub use scan::{SchemaMap, scan_schema, type_label};
