use super::{
    Figure, LatLon, Layout, Legend, MapBounds, MapTrace, Mapbox, Margin, Marker, Title, Trace,
    QUALITATIVE_PALETTE,
};
use crate::process::table::ObservationTable;
use arrow::{array::Array, error::ArrowError};
use std::collections::HashMap;

pub const MAP_STYLE: &str = "open-street-map";
pub const MAP_ZOOM: f64 = 5.0;
pub const MAP_HEIGHT: u32 = 600;
/// Degrees added around the data extent when limiting panning.
pub const BOUNDS_MARGIN_DEG: f64 = 0.05;
pub const LEGEND_TITLE: &str = "File number";

/// One marker per distinct point id, colored by track.
///
/// Points are deduplicated by id alone, so an id reused by a second track only
/// shows up under the first. Framing uses the extent of the whole table.
pub fn map_figure(table: &ObservationTable) -> Result<Figure, ArrowError> {
    let points = table.dedup_by_point()?;

    let mut traces: Vec<MapTrace> = Vec::new();
    let mut by_track: HashMap<String, usize> = HashMap::new();
    let (pids, lats, lons, tracks) = (
        points.point_ids(),
        points.latitudes(),
        points.longitudes(),
        points.tracks(),
    );
    for i in 0..points.len() {
        let track = tracks.value(i);
        let slot = *by_track.entry(track.to_string()).or_insert_with(|| {
            let color = QUALITATIVE_PALETTE[traces.len() % QUALITATIVE_PALETTE.len()];
            traces.push(MapTrace {
                name: track.to_string(),
                legendgroup: track.to_string(),
                showlegend: true,
                mode: "markers".into(),
                lat: Vec::new(),
                lon: Vec::new(),
                hovertext: Vec::new(),
                marker: Marker {
                    color: color.to_string(),
                },
            });
            traces.len() - 1
        });
        let trace = &mut traces[slot];
        trace.lat.push(lats.is_valid(i).then(|| lats.value(i)));
        trace.lon.push(lons.is_valid(i).then(|| lons.value(i)));
        trace.hovertext.push(pids.value(i).to_string());
    }

    let (center, bounds) = match table.bounds() {
        Some(bbox) => {
            let (lat, lon) = bbox.center();
            let padded = bbox.padded(BOUNDS_MARGIN_DEG);
            (
                Some(LatLon { lat, lon }),
                Some(MapBounds {
                    west: padded.min_lon,
                    east: padded.max_lon,
                    south: padded.min_lat,
                    north: padded.max_lat,
                }),
            )
        }
        None => (None, None),
    };

    Ok(Figure {
        data: traces.into_iter().map(Trace::Scattermapbox).collect(),
        layout: Layout {
            height: Some(MAP_HEIGHT),
            mapbox: Some(Mapbox {
                style: MAP_STYLE.into(),
                zoom: MAP_ZOOM,
                center,
                bounds,
            }),
            legend: Some(Legend {
                title: Title::new(LEGEND_TITLE),
            }),
            margin: Some(Margin {
                t: 60,
                r: 0,
                b: 0,
                l: 0,
            }),
            ..Layout::default()
        },
    })
}
