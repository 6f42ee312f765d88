//! Plotly figure descriptions.
//!
//! The browser renders these with Plotly.js; the server only builds the JSON
//! `{data, layout}` documents. Unset layout keys are omitted so Plotly falls
//! back to its own defaults.

use serde::Serialize;

pub mod detail;
pub mod map;

pub use detail::detail_figure;
pub use map::map_figure;

/// Plotly's default qualitative palette, in the order categorical traces use it.
pub const QUALITATIVE_PALETTE: [&str; 10] = [
    "#636efa", "#EF553B", "#00cc96", "#ab63fa", "#FFA15A", "#19d3f3", "#FF6692", "#B6E880",
    "#FF97FF", "#FECB52",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

impl Figure {
    /// `{"data": [], "layout": {}}`, what a cleared graph shows.
    pub fn empty() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Trace {
    Scattermapbox(MapTrace),
    Scatter(LineTrace),
}

/// Markers on a tile map, one trace per category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapTrace {
    pub name: String,
    pub legendgroup: String,
    pub showlegend: bool,
    pub mode: String,
    pub lat: Vec<Option<f64>>,
    pub lon: Vec<Option<f64>>,
    pub hovertext: Vec<String>,
    pub marker: Marker,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineTrace {
    pub mode: String,
    pub showlegend: bool,
    pub x: Vec<String>,
    pub y: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub color: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Layout {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Title>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapbox: Option<Mapbox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legend: Option<Legend>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xaxis: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaxis: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin: Option<Margin>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Title {
    pub text: String,
}

impl Title {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Legend {
    pub title: Title,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    pub title: Title,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Margin {
    pub t: u32,
    pub r: u32,
    pub b: u32,
    pub l: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mapbox {
    pub style: String,
    pub zoom: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub center: Option<LatLon>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounds: Option<MapBounds>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MapBounds {
    pub west: f64,
    pub east: f64,
    pub south: f64,
    pub north: f64,
}
