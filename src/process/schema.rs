use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use std::sync::{Arc, LazyLock};

pub const PID: &str = "pid";
pub const LATITUDE: &str = "latitude";
pub const LONGITUDE: &str = "longitude";
pub const HEIGHT: &str = "height";
pub const TIMESTAMP: &str = "timestamp";
pub const DISPLACEMENT: &str = "displacement";
pub const TRACK: &str = "track";

/// Identifier columns every wide track CSV must carry.
pub const ID_COLUMNS: [&str; 4] = [PID, LATITUDE, LONGITUDE, HEIGHT];

static OBSERVATION_SCHEMA: LazyLock<SchemaRef> = LazyLock::new(|| {
    Arc::new(Schema::new(vec![
        Field::new(PID, DataType::Utf8, false),
        Field::new(LATITUDE, DataType::Float64, true),
        Field::new(LONGITUDE, DataType::Float64, true),
        Field::new(HEIGHT, DataType::Float64, true),
        Field::new(TIMESTAMP, DataType::Date32, false),
        Field::new(DISPLACEMENT, DataType::Float64, false),
        Field::new(TRACK, DataType::Utf8, false),
    ]))
});

/// Long-format schema: one row per (point, date) pair.
pub fn observation_schema() -> SchemaRef {
    Arc::clone(&OBSERVATION_SCHEMA)
}

/// Raw read schema for a wide CSV: every header as a nullable string column,
/// typed later per column.
pub fn raw_string_schema(headers: &[String]) -> SchemaRef {
    let fields: Vec<Field> = headers
        .iter()
        .map(|n| Field::new(n, DataType::Utf8, true))
        .collect();
    Arc::new(Schema::new(fields))
}
