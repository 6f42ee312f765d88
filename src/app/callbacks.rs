//! The dashboard's two view updates and their bindings.

use crate::{
    app::registry::{CallbackRegistry, ComponentProp},
    error::DispatchError,
    figure::{detail_figure, map_figure, Figure},
    process::ObservationTable,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

pub const MAP_ID: &str = "map";
pub const DETAIL_CONTAINER_ID: &str = "displacement-container";
pub const DETAIL_GRAPH_ID: &str = "displacement-graph";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Display {
    #[serde(rename = "block")]
    Block,
    #[serde(rename = "none")]
    Hidden,
}

/// Inline style of the detail container; only `display` is ever set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerStyle {
    pub display: Display,
}

impl ContainerStyle {
    pub const VISIBLE: ContainerStyle = ContainerStyle {
        display: Display::Block,
    };
    pub const HIDDEN: ContainerStyle = ContainerStyle {
        display: Display::Hidden,
    };
}

/// Plotly `clickData`; only the hover label of the first point is used.
#[derive(Debug, Deserialize)]
struct ClickData {
    points: Vec<ClickedPoint>,
}

#[derive(Debug, Deserialize)]
struct ClickedPoint {
    hovertext: String,
}

/// Point id carried by a map click, `None` when the selection was cleared.
pub fn clicked_point_id(click: &Value) -> Result<Option<String>, DispatchError> {
    if click.is_null() {
        return Ok(None);
    }
    let data = ClickData::deserialize(click)
        .map_err(|e| DispatchError::BadPayload(format!("clickData: {e}")))?;
    let first = data
        .points
        .into_iter()
        .next()
        .ok_or_else(|| DispatchError::BadPayload("clickData has no points".into()))?;
    Ok(Some(first.hovertext))
}

/// Map of every point, built on mount.
pub fn update_map(table: &ObservationTable) -> Result<Figure, DispatchError> {
    let fig = map_figure(table)?;
    info!(traces = fig.data.len(), "map rendered");
    Ok(fig)
}

/// Time series of the clicked point plus the detail container's visibility.
pub fn display_displacement(
    table: &ObservationTable,
    click: &Value,
) -> Result<(Figure, ContainerStyle), DispatchError> {
    match clicked_point_id(click)? {
        None => Ok((Figure::empty(), ContainerStyle::HIDDEN)),
        Some(pid) => {
            let fig = detail_figure(table, &pid)?;
            debug!(point = %pid, "detail rendered");
            Ok((fig, ContainerStyle::VISIBLE))
        }
    }
}

/// Registry holding both dashboard view updates.
pub fn dashboard_registry() -> CallbackRegistry {
    let mut registry = CallbackRegistry::new();

    // `map.id` never changes, so this fires once when the page mounts the map
    registry.register(
        ComponentProp::new(MAP_ID, "id"),
        vec![ComponentProp::new(MAP_ID, "figure")],
        |table, _| Ok(vec![serde_json::to_value(update_map(table)?)?]),
    );

    registry.register(
        ComponentProp::new(MAP_ID, "clickData"),
        vec![
            ComponentProp::new(DETAIL_GRAPH_ID, "figure"),
            ComponentProp::new(DETAIL_CONTAINER_ID, "style"),
        ],
        |table, click| {
            let (fig, style) = display_displacement(table, click)?;
            Ok(vec![serde_json::to_value(fig)?, serde_json::to_value(style)?])
        },
    );

    registry
}
