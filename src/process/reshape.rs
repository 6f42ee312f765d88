use crate::error::LoadError;
use crate::process::{
    date_parser,
    schema::{raw_string_schema, ID_COLUMNS},
    table::ObservationTable,
    utils::parse_float,
};
use arrow::{
    array::{Array, AsArray, Date32Builder, Float64Builder, StringArray, StringBuilder},
    compute::concat_batches,
    csv::{reader::Format, ReaderBuilder},
    record_batch::RecordBatch,
};
use std::{fs, io::Cursor, io::ErrorKind, path::Path, sync::Arc};
use tracing::{debug, info};

/// A wide track CSV read verbatim: every column as nullable text.
struct WideTable {
    batch: RecordBatch,
}

impl WideTable {
    fn column(&self, name: &str) -> Option<&StringArray> {
        self.batch.column_by_name(name).map(|c| c.as_string::<i32>())
    }
}

/// Read one wide track CSV and melt it into long format.
///
/// Every digit-only header becomes a date; each (point, date) cell with a
/// displacement value becomes one row tagged with `track_label`. Rows are
/// emitted date column by date column, points in file order within each.
#[tracing::instrument(level = "info", skip(path), fields(path = %path.as_ref().display()))]
pub fn reshape<P: AsRef<Path>>(
    path: P,
    track_label: &str,
) -> Result<ObservationTable, LoadError> {
    let path = path.as_ref();
    let wide = read_wide_csv(path)?;

    let mut ids = Vec::with_capacity(ID_COLUMNS.len());
    for name in ID_COLUMNS {
        let col = wide.column(name).ok_or_else(|| LoadError::MalformedInput {
            path: path.to_path_buf(),
            reason: format!("missing required column `{name}`"),
        })?;
        ids.push(col);
    }
    let (pids, lats, lons, heights) = (ids[0], ids[1], ids[2], ids[3]);

    // (column index, days since epoch) for every observation column, in file order
    let schema = wide.batch.schema();
    let mut date_columns = Vec::new();
    for (idx, field) in schema.fields().iter().enumerate() {
        let name = field.name();
        if !date_parser::is_date_column(name) {
            continue;
        }
        let days = date_parser::parse_date32(name).ok_or_else(|| LoadError::DateParse {
            path: path.to_path_buf(),
            column: name.clone(),
        })?;
        date_columns.push((idx, days));
    }
    debug!(
        points = wide.batch.num_rows(),
        dates = date_columns.len(),
        "wide table read"
    );

    let capacity = wide.batch.num_rows() * date_columns.len();
    let mut pid_b = StringBuilder::with_capacity(capacity, capacity * 8);
    let mut lat_b = Float64Builder::with_capacity(capacity);
    let mut lon_b = Float64Builder::with_capacity(capacity);
    let mut height_b = Float64Builder::with_capacity(capacity);
    let mut ts_b = Date32Builder::with_capacity(capacity);
    let mut disp_b = Float64Builder::with_capacity(capacity);
    let mut track_b = StringBuilder::with_capacity(capacity, capacity * track_label.len());

    let mut dropped = 0usize;
    for &(idx, days) in &date_columns {
        let values = wide.batch.column(idx).as_string::<i32>();
        for (row, raw) in values.iter().enumerate() {
            let Some(displacement) = parse_float(raw) else {
                dropped += 1;
                continue;
            };
            pid_b.append_value(cell(pids, row).unwrap_or_default());
            lat_b.append_option(parse_float(cell(lats, row)));
            lon_b.append_option(parse_float(cell(lons, row)));
            height_b.append_option(parse_float(cell(heights, row)));
            ts_b.append_value(days);
            disp_b.append_value(displacement);
            track_b.append_value(track_label);
        }
    }

    let table = ObservationTable::from_columns(vec![
        Arc::new(pid_b.finish()),
        Arc::new(lat_b.finish()),
        Arc::new(lon_b.finish()),
        Arc::new(height_b.finish()),
        Arc::new(ts_b.finish()),
        Arc::new(disp_b.finish()),
        Arc::new(track_b.finish()),
    ])?;
    info!(track = %track_label, rows = table.len(), dropped, "reshaped");
    Ok(table)
}

fn cell(col: &StringArray, row: usize) -> Option<&str> {
    col.is_valid(row).then(|| col.value(row))
}

fn read_wide_csv(path: &Path) -> Result<WideTable, LoadError> {
    let data = fs::read(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => LoadError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => LoadError::Io {
            path: path.to_path_buf(),
            source: e,
        },
    })?;
    let malformed = |e: arrow::error::ArrowError| LoadError::MalformedInput {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };

    // header names only; every column is read as text and typed per column later
    let (inferred, _) = Format::default()
        .with_header(true)
        .infer_schema(Cursor::new(&data), Some(0))
        .map_err(malformed)?;
    let headers: Vec<String> = inferred.fields().iter().map(|f| f.name().clone()).collect();
    let schema = raw_string_schema(&headers);

    let reader = ReaderBuilder::new(schema.clone())
        .with_header(true)
        .with_truncated_rows(true)
        .build(Cursor::new(&data))
        .map_err(malformed)?;
    let batches = reader.collect::<Result<Vec<_>, _>>().map_err(malformed)?;
    let batch = concat_batches(&schema, &batches).map_err(malformed)?;
    Ok(WideTable { batch })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    fn init_test_logging() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("info,dispdash::process=debug")),
            )
            .with_test_writer()
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }

    fn csv_file(content: &str) -> NamedTempFile {
        let mut tmp = NamedTempFile::new().expect("tempfile");
        tmp.write_all(content.as_bytes()).expect("write csv");
        tmp
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn melts_every_point_and_date() -> anyhow::Result<()> {
        init_test_logging();
        let tmp = csv_file(
            "pid,latitude,longitude,height,20200101,20200115\n\
             P1,10.0,20.0,5.5,1.5,2.5\n\
             P2,10.2,20.4,6.5,-0.5,0.25\n",
        );

        let table = reshape(tmp.path(), "124_0770_IW3_VV")?;
        let rows: Vec<_> = table.rows().collect();
        assert_eq!(rows.len(), 4);

        let summary: Vec<(&str, NaiveDate, f64)> = rows
            .iter()
            .map(|r| (r.point_id.as_str(), r.timestamp, r.displacement))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("P1", date(2020, 1, 1), 1.5),
                ("P2", date(2020, 1, 1), -0.5),
                ("P1", date(2020, 1, 15), 2.5),
                ("P2", date(2020, 1, 15), 0.25),
            ]
        );
        assert!(rows.iter().all(|r| r.track == "124_0770_IW3_VV"));
        assert_eq!(rows[1].latitude, Some(10.2));
        assert_eq!(rows[1].longitude, Some(20.4));
        assert_eq!(rows[1].height, Some(6.5));
        Ok(())
    }

    #[test]
    fn drops_missing_displacements() -> anyhow::Result<()> {
        let tmp = csv_file(
            "pid,latitude,longitude,height,20200101,20200115\n\
             P1,10.0,20.0,5.5,1.5,\n\
             P2,10.2,20.4,6.5,-0.5,0.25\n",
        );

        let table = reshape(tmp.path(), "t")?;
        let pairs: Vec<(String, NaiveDate)> =
            table.rows().map(|r| (r.point_id, r.timestamp)).collect();
        assert_eq!(pairs.len(), 3);
        assert!(!pairs.contains(&("P1".to_string(), date(2020, 1, 15))));
        Ok(())
    }

    #[test]
    fn nan_and_na_markers_count_as_missing() -> anyhow::Result<()> {
        let tmp = csv_file(
            "pid,latitude,longitude,height,20200101,20200115,20200201\n\
             P1,10.0,20.0,5.5,NaN,NA,3.0\n",
        );
        let table = reshape(tmp.path(), "t")?;
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows().next().unwrap().timestamp, date(2020, 2, 1));
        Ok(())
    }

    #[test]
    fn ignores_non_numeric_columns() -> anyhow::Result<()> {
        let tmp = csv_file(
            "pid,latitude,longitude,height,notes,20200101,velocity\n\
             P1,10.0,20.0,5.5,stable,1.0,0.1\n",
        );
        let table = reshape(tmp.path(), "t")?;
        let rows: Vec<_> = table.rows().collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].timestamp, date(2020, 1, 1));
        assert_eq!(rows[0].displacement, 1.0);
        Ok(())
    }

    #[test]
    fn no_date_columns_yields_empty_table() -> anyhow::Result<()> {
        let tmp = csv_file("pid,latitude,longitude,height\nP1,10.0,20.0,5.5\n");
        let table = reshape(tmp.path(), "t")?;
        assert!(table.is_empty());
        Ok(())
    }

    #[test]
    fn missing_file_is_file_not_found() {
        let err = reshape("/definitely/not/here.csv", "t").unwrap_err();
        assert!(matches!(err, LoadError::FileNotFound { .. }), "{err}");
    }

    #[test]
    fn missing_id_column_is_malformed() {
        let tmp = csv_file("pid,latitude,height,20200101\nP1,10.0,5.5,1.0\n");
        match reshape(tmp.path(), "t").unwrap_err() {
            LoadError::MalformedInput { reason, .. } => assert!(reason.contains("longitude")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn invalid_calendar_date_column_fails() {
        let tmp = csv_file("pid,latitude,longitude,height,20201301\nP1,10.0,20.0,5.5,1.0\n");
        match reshape(tmp.path(), "t").unwrap_err() {
            LoadError::DateParse { column, .. } => assert_eq!(column, "20201301"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn quoted_point_ids_are_unquoted() -> anyhow::Result<()> {
        let tmp = csv_file(
            "pid,latitude,longitude,height,20200101\n\"P,1\",10.0,20.0,5.5,1.0\n",
        );
        let table = reshape(tmp.path(), "t")?;
        assert_eq!(table.rows().next().unwrap().point_id, "P,1");
        Ok(())
    }
}
