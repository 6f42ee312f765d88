// src/process/mod.rs
use crate::{config::TrackSource, error::LoadError};
use rayon::prelude::*;
use std::time::Instant;
use tracing::{info, warn};

pub mod date_parser;
pub mod reshape;
pub mod schema;
pub mod table;
pub mod utils;

pub use reshape::reshape;
pub use table::{BoundingBox, Observation, ObservationTable};

/// Reshape every configured track and stack them in configuration order.
///
/// Tracks are read in parallel; the first failure aborts the whole load so the
/// caller never sees a partial table.
#[tracing::instrument(level = "info", skip(sources), fields(tracks = sources.len()))]
pub fn load_tracks(sources: &[TrackSource]) -> Result<ObservationTable, LoadError> {
    let start = Instant::now();
    let tables = sources
        .par_iter()
        .map(|src| reshape(&src.path, &src.label))
        .collect::<Result<Vec<_>, _>>()?;

    let table = ObservationTable::concat(tables)?;
    info!(rows = table.len(), elapsed = ?start.elapsed(), "observation table built");

    let shared = table.shared_point_ids();
    if !shared.is_empty() {
        // the map keeps only the first track's marker for these
        warn!(
            count = shared.len(),
            sample = ?&shared[..shared.len().min(5)],
            "point ids reused across tracks"
        );
    }
    Ok(table)
}
