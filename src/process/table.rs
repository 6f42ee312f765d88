use crate::process::schema::{
    observation_schema, DISPLACEMENT, HEIGHT, LATITUDE, LONGITUDE, PID, TIMESTAMP, TRACK,
};
use arrow::{
    array::{
        Array, ArrayRef, AsArray, BooleanArray, Date32Array, Float64Array, StringArray,
        UInt32Array,
    },
    compute::{self, concat_batches, filter_record_batch, kernels::cmp::eq, take_record_batch},
    datatypes::{Date32Type, Float64Type},
    error::ArrowError,
    record_batch::RecordBatch,
};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// One reshaped measurement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    pub point_id: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub height: Option<f64>,
    pub timestamp: NaiveDate,
    pub displacement: f64,
    pub track: String,
}

/// Latitude/longitude extent in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    /// `(lat, lon)` of the box midpoint.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lon + self.max_lon) / 2.0,
        )
    }

    pub fn padded(&self, margin_deg: f64) -> BoundingBox {
        BoundingBox {
            min_lat: self.min_lat - margin_deg,
            max_lat: self.max_lat + margin_deg,
            min_lon: self.min_lon - margin_deg,
            max_lon: self.max_lon + margin_deg,
        }
    }
}

/// Long-format observation table backed by a single Arrow `RecordBatch`.
///
/// The batch always carries [`observation_schema`]; every query returns a new
/// table and leaves `self` untouched.
#[derive(Debug, Clone)]
pub struct ObservationTable {
    batch: RecordBatch,
}

impl ObservationTable {
    /// Wrap a batch, rejecting anything not shaped like the observation schema.
    pub fn try_new(batch: RecordBatch) -> Result<Self, ArrowError> {
        let expected = observation_schema();
        if batch.schema().fields() != expected.fields() {
            return Err(ArrowError::SchemaError(format!(
                "expected observation schema {:?}, got {:?}",
                expected.fields(),
                batch.schema().fields()
            )));
        }
        Ok(Self { batch })
    }

    /// Build from column arrays in schema order.
    pub fn from_columns(columns: Vec<ArrayRef>) -> Result<Self, ArrowError> {
        Self::try_new(RecordBatch::try_new(observation_schema(), columns)?)
    }

    pub fn empty() -> Self {
        Self {
            batch: RecordBatch::new_empty(observation_schema()),
        }
    }

    /// Row-wise union in iteration order.
    pub fn concat<I>(tables: I) -> Result<Self, ArrowError>
    where
        I: IntoIterator<Item = ObservationTable>,
    {
        let batches: Vec<RecordBatch> = tables.into_iter().map(|t| t.batch).collect();
        let combined = concat_batches(&observation_schema(), batches.iter())?;
        Ok(Self { batch: combined })
    }

    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn len(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn is_empty(&self) -> bool {
        self.batch.num_rows() == 0
    }

    fn column(&self, name: &str) -> &ArrayRef {
        // schema is checked in `try_new`
        self.batch
            .column_by_name(name)
            .unwrap_or_else(|| unreachable!("observation column `{name}` missing"))
    }

    pub fn point_ids(&self) -> &StringArray {
        self.column(PID).as_string::<i32>()
    }

    pub fn latitudes(&self) -> &Float64Array {
        self.column(LATITUDE).as_primitive::<Float64Type>()
    }

    pub fn longitudes(&self) -> &Float64Array {
        self.column(LONGITUDE).as_primitive::<Float64Type>()
    }

    pub fn heights(&self) -> &Float64Array {
        self.column(HEIGHT).as_primitive::<Float64Type>()
    }

    pub fn timestamps(&self) -> &Date32Array {
        self.column(TIMESTAMP).as_primitive::<Date32Type>()
    }

    pub fn displacements(&self) -> &Float64Array {
        self.column(DISPLACEMENT).as_primitive::<Float64Type>()
    }

    pub fn tracks(&self) -> &StringArray {
        self.column(TRACK).as_string::<i32>()
    }

    /// Keep the first row seen for each point id, regardless of track.
    pub fn dedup_by_point(&self) -> Result<Self, ArrowError> {
        let pids = self.point_ids();
        let mut seen: HashSet<&str> = HashSet::with_capacity(pids.len());
        let mask: BooleanArray = pids
            .iter()
            .map(|pid| Some(seen.insert(pid.unwrap_or_default())))
            .collect();
        self.filtered(&mask)
    }

    /// Rows whose point id equals `pid`, in table order.
    pub fn filter_point(&self, pid: &str) -> Result<Self, ArrowError> {
        let mask = eq(self.point_ids(), &StringArray::new_scalar(pid))?;
        self.filtered(&mask)
    }

    /// Stable ascending sort by observation date.
    pub fn sort_by_timestamp(&self) -> Result<Self, ArrowError> {
        let dates = self.timestamps();
        let mut order: Vec<u32> = (0..self.len() as u32).collect();
        order.sort_by_key(|&i| dates.value(i as usize));
        let indices = UInt32Array::from(order);
        Ok(Self {
            batch: take_record_batch(&self.batch, &indices)?,
        })
    }

    /// Extent of every non-null coordinate in the table; `None` when there is none.
    pub fn bounds(&self) -> Option<BoundingBox> {
        Some(BoundingBox {
            min_lat: compute::min(self.latitudes())?,
            max_lat: compute::max(self.latitudes())?,
            min_lon: compute::min(self.longitudes())?,
            max_lon: compute::max(self.longitudes())?,
        })
    }

    /// Distinct track labels in first-appearance order.
    pub fn track_labels(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.tracks()
            .iter()
            .flatten()
            .filter(|t| seen.insert(*t))
            .map(str::to_string)
            .collect()
    }

    /// Point ids observed by more than one track, sorted.
    pub fn shared_point_ids(&self) -> Vec<String> {
        let mut owners: HashMap<&str, HashSet<&str>> = HashMap::new();
        for (pid, track) in self.point_ids().iter().zip(self.tracks().iter()) {
            if let (Some(pid), Some(track)) = (pid, track) {
                owners.entry(pid).or_default().insert(track);
            }
        }
        let mut shared: Vec<String> = owners
            .into_iter()
            .filter(|(_, tracks)| tracks.len() > 1)
            .map(|(pid, _)| pid.to_string())
            .collect();
        shared.sort();
        shared
    }

    pub fn rows(&self) -> impl Iterator<Item = Observation> + '_ {
        let (pids, lats, lons, heights) = (
            self.point_ids(),
            self.latitudes(),
            self.longitudes(),
            self.heights(),
        );
        let (dates, disps, tracks) = (self.timestamps(), self.displacements(), self.tracks());
        (0..self.len()).map(move |i| Observation {
            point_id: pids.value(i).to_string(),
            latitude: value_at(lats, i),
            longitude: value_at(lons, i),
            height: value_at(heights, i),
            timestamp: Date32Type::to_naive_date(dates.value(i)),
            displacement: disps.value(i),
            track: tracks.value(i).to_string(),
        })
    }

    fn filtered(&self, mask: &BooleanArray) -> Result<Self, ArrowError> {
        Ok(Self {
            batch: filter_record_batch(&self.batch, mask)?,
        })
    }
}

fn value_at(arr: &Float64Array, i: usize) -> Option<f64> {
    arr.is_valid(i).then(|| arr.value(i))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use arrow::array::{Date32Builder, Float64Builder, StringBuilder};
    use std::sync::Arc;

    /// `(pid, lat, lon, yyyymmdd, displacement, track)`
    pub(crate) type Row<'a> = (&'a str, f64, f64, &'a str, f64, &'a str);

    pub(crate) fn table_from_rows(rows: &[Row<'_>]) -> ObservationTable {
        let mut pid = StringBuilder::new();
        let mut lat = Float64Builder::new();
        let mut lon = Float64Builder::new();
        let mut height = Float64Builder::new();
        let mut ts = Date32Builder::new();
        let mut disp = Float64Builder::new();
        let mut track = StringBuilder::new();
        for &(p, la, lo, date, d, t) in rows {
            pid.append_value(p);
            lat.append_value(la);
            lon.append_value(lo);
            height.append_value(100.0);
            ts.append_value(crate::process::date_parser::parse_date32(date).expect("test date"));
            disp.append_value(d);
            track.append_value(t);
        }
        ObservationTable::from_columns(vec![
            Arc::new(pid.finish()),
            Arc::new(lat.finish()),
            Arc::new(lon.finish()),
            Arc::new(height.finish()),
            Arc::new(ts.finish()),
            Arc::new(disp.finish()),
            Arc::new(track.finish()),
        ])
        .expect("valid observation columns")
    }

    fn pids(table: &ObservationTable) -> Vec<String> {
        table.rows().map(|r| r.point_id).collect()
    }

    #[test]
    fn concat_keeps_row_count_and_track_labels() {
        let a = table_from_rows(&[
            ("A1", 1.0, 2.0, "20200101", 1.0, "asc"),
            ("A2", 1.0, 2.0, "20200101", 2.0, "asc"),
        ]);
        let b = table_from_rows(&[("B1", 1.0, 2.0, "20200101", 3.0, "desc")]);

        let all = ObservationTable::concat(vec![a.clone(), b.clone()]).unwrap();
        assert_eq!(all.len(), a.len() + b.len());
        for row in all.rows() {
            let expected = if row.point_id.starts_with('A') { "asc" } else { "desc" };
            assert_eq!(row.track, expected);
        }
        assert_eq!(all.track_labels(), vec!["asc", "desc"]);
    }

    #[test]
    fn concat_of_nothing_is_empty() {
        let t = ObservationTable::concat(Vec::new()).unwrap();
        assert!(t.is_empty());
        assert!(t.bounds().is_none());
    }

    #[test]
    fn dedup_keeps_first_occurrence_across_tracks() {
        let t = table_from_rows(&[
            ("P1", 10.0, 20.0, "20200101", 1.0, "asc"),
            ("P1", 10.0, 20.0, "20200115", 2.0, "asc"),
            ("P2", 11.0, 21.0, "20200101", 3.0, "asc"),
            ("P1", 12.0, 22.0, "20200101", 4.0, "desc"),
        ]);
        let dedup = t.dedup_by_point().unwrap();
        assert_eq!(pids(&dedup), vec!["P1", "P2"]);
        let first = dedup.rows().next().unwrap();
        assert_eq!(first.track, "asc");
        assert_eq!(first.displacement, 1.0);
        assert_eq!(t.shared_point_ids(), vec!["P1"]);
    }

    #[test]
    fn bounds_cover_whole_table() {
        let t = table_from_rows(&[
            ("P1", 10.0, 20.4, "20200101", 1.0, "asc"),
            ("P2", 10.2, 20.0, "20200101", 1.0, "asc"),
        ]);
        let bbox = t.bounds().unwrap();
        let (lat, lon) = bbox.center();
        assert!((lat - 10.1).abs() < 1e-9);
        assert!((lon - 20.2).abs() < 1e-9);

        let padded = bbox.padded(0.05);
        assert!((padded.min_lat - 9.95).abs() < 1e-9);
        assert!((padded.max_lat - 10.25).abs() < 1e-9);
        assert!((padded.min_lon - 19.95).abs() < 1e-9);
        assert!((padded.max_lon - 20.45).abs() < 1e-9);
    }

    #[test]
    fn filter_point_selects_only_matching_rows() {
        let t = table_from_rows(&[
            ("P123", 1.0, 2.0, "20200101", 1.0, "asc"),
            ("P9", 1.0, 2.0, "20200101", 2.0, "asc"),
            ("P123", 1.0, 2.0, "20200115", 3.0, "asc"),
        ]);
        let hit = t.filter_point("P123").unwrap();
        assert_eq!(pids(&hit), vec!["P123", "P123"]);
        assert!(t.filter_point("nope").unwrap().is_empty());
    }

    #[test]
    fn sort_by_timestamp_is_stable() {
        let t = table_from_rows(&[
            ("P1", 1.0, 2.0, "20200301", 3.0, "asc"),
            ("P1", 1.0, 2.0, "20200101", 1.0, "asc"),
            ("P1", 1.0, 2.0, "20200201", 2.0, "asc"),
            ("P1", 1.0, 2.0, "20200101", 9.0, "desc"),
        ]);
        let sorted = t.sort_by_timestamp().unwrap();
        let disps: Vec<f64> = sorted.rows().map(|r| r.displacement).collect();
        assert_eq!(disps, vec![1.0, 9.0, 2.0, 3.0]);
    }

    #[test]
    fn try_new_rejects_foreign_schema() {
        let batch = RecordBatch::new_empty(crate::process::schema::raw_string_schema(&[
            "pid".to_string(),
        ]));
        assert!(ObservationTable::try_new(batch).is_err());
    }
}
