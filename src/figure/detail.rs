use super::{Axis, Figure, Layout, LineTrace, Title, Trace};
use crate::process::table::ObservationTable;
use arrow::{datatypes::Date32Type, error::ArrowError};

pub const X_AXIS_TITLE: &str = "Date";
pub const Y_AXIS_TITLE: &str = "Displacement (mm)";

pub fn detail_title(point_id: &str) -> String {
    format!("Displacement Data for Point {point_id}")
}

/// Displacement-over-time line for a single point, oldest observation first.
///
/// An id with no rows still gets a titled figure with one empty trace.
pub fn detail_figure(table: &ObservationTable, point_id: &str) -> Result<Figure, ArrowError> {
    let series = table.filter_point(point_id)?.sort_by_timestamp()?;

    let x: Vec<String> = series
        .timestamps()
        .values()
        .iter()
        .map(|&days| Date32Type::to_naive_date(days).format("%Y-%m-%d").to_string())
        .collect();
    let y: Vec<f64> = series.displacements().values().to_vec();

    Ok(Figure {
        data: vec![Trace::Scatter(LineTrace {
            mode: "lines+markers".into(),
            showlegend: false,
            x,
            y,
        })],
        layout: Layout {
            title: Some(Title::new(detail_title(point_id))),
            xaxis: Some(Axis {
                title: Title::new(X_AXIS_TITLE),
            }),
            yaxis: Some(Axis {
                title: Title::new(Y_AXIS_TITLE),
            }),
            ..Layout::default()
        },
    })
}
