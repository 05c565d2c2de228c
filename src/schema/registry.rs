//! Canonical trip-event schema

use super::types::{CanonicalField, CanonicalSchema, SemanticType};

/// Column the partition year is written to
pub const YEAR_COLUMN: &str = "trip_year";

/// Column the partition month is written to
pub const MONTH_COLUMN: &str = "trip_month";

/// Source column for partitioning
pub const START_TIMESTAMP_COLUMN: &str = "trip_start_timestamp";

/// Trip end timestamp, as served by the API
pub const END_TIMESTAMP_COLUMN: &str = "trip_end_timestamp";

/// Unique trip identifier
pub const TRIP_ID_COLUMN: &str = "trip_id";

/// GeoJSON point as served by the open-data API:
/// `{"type": "Point", "coordinates": [lon, lat]}`
pub fn point_type() -> SemanticType {
    SemanticType::Struct(vec![
        CanonicalField::new("type", SemanticType::Text),
        CanonicalField::new(
            "coordinates",
            SemanticType::List(Box::new(SemanticType::Float64)),
        ),
    ])
}

impl CanonicalSchema {
    /// The canonical field set of one taxi trip event
    pub fn trip_events() -> Self {
        use SemanticType::{Float64, Int64, Text, UInt16, UInt8};

        let fields = vec![
            CanonicalField::new(TRIP_ID_COLUMN, Text),
            CanonicalField::new("taxi_id", Text),
            CanonicalField::new(START_TIMESTAMP_COLUMN, Text),
            CanonicalField::new(END_TIMESTAMP_COLUMN, Text),
            CanonicalField::new("trip_seconds", Int64),
            CanonicalField::new("trip_miles", Float64),
            CanonicalField::new(YEAR_COLUMN, UInt16),
            CanonicalField::new(MONTH_COLUMN, UInt8),
            CanonicalField::new("pickup_census_tract", Text),
            CanonicalField::new("dropoff_census_tract", Text),
            CanonicalField::new("pickup_community_area", Int64),
            CanonicalField::new("dropoff_community_area", Int64),
            CanonicalField::new("fare", Float64),
            CanonicalField::new("tips", Float64),
            CanonicalField::new("tolls", Float64),
            CanonicalField::new("extras", Float64),
            CanonicalField::new("trip_total", Float64),
            CanonicalField::new("payment_type", Text),
            CanonicalField::new("company", Text),
            CanonicalField::new("pickup_centroid_latitude", Float64),
            CanonicalField::new("pickup_centroid_longitude", Float64),
            CanonicalField::new("pickup_centroid_location", point_type()),
            CanonicalField::new("dropoff_centroid_latitude", Float64),
            CanonicalField::new("dropoff_centroid_longitude", Float64),
            CanonicalField::new("dropoff_centroid_location", point_type()),
        ];

        Self::new(
            fields,
            START_TIMESTAMP_COLUMN,
            END_TIMESTAMP_COLUMN,
            YEAR_COLUMN,
            MONTH_COLUMN,
        )
        .expect("built-in trip schema is valid")
    }
}

impl Default for CanonicalSchema {
    fn default() -> Self {
        Self::trip_events()
    }
}
