//! Schema module
//!
//! The canonical trip-event schema and the column aligner that projects
//! heterogeneous JSON batches onto it.
//!
//! # Features
//!
//! - **Canonical Schema**: Ordered, immutable field list passed explicitly
//! - **Column Alignment**: Missing columns null-filled, extras dropped
//! - **Type Conversion**: Strict casts, struct children matched by name

mod align;
mod registry;
mod types;

pub use align::{align, conform_array, dropped_columns, missing_columns};
pub use registry::{
    point_type, END_TIMESTAMP_COLUMN, MONTH_COLUMN, START_TIMESTAMP_COLUMN, TRIP_ID_COLUMN,
    YEAR_COLUMN,
};
pub use types::{CanonicalField, CanonicalSchema, SemanticType};
