use crate::app::callbacks::{ContainerStyle, DETAIL_CONTAINER_ID, DETAIL_GRAPH_ID, MAP_ID};
use serde::Serialize;

/// A node of the page's component tree as served by `/_dash-layout`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Component {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub id: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<ContainerStyle>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Component>,
}

impl Component {
    fn graph(id: &'static str) -> Self {
        Self {
            kind: "Graph",
            id,
            style: None,
            children: Vec::new(),
        }
    }
}

/// Map on top, detail graph below inside a container that starts hidden.
pub fn dashboard_layout() -> Component {
    Component {
        kind: "Div",
        id: "dashboard",
        style: None,
        children: vec![
            Component::graph(MAP_ID),
            Component {
                kind: "Div",
                id: DETAIL_CONTAINER_ID,
                style: Some(ContainerStyle::HIDDEN),
                children: vec![Component::graph(DETAIL_GRAPH_ID)],
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn detail_container_starts_hidden() {
        let v = serde_json::to_value(dashboard_layout()).unwrap();
        assert_eq!(v["children"][0], json!({"type": "Graph", "id": "map"}));
        assert_eq!(v["children"][1]["id"], "displacement-container");
        assert_eq!(v["children"][1]["style"], json!({"display": "none"}));
        assert_eq!(v["children"][1]["children"][0]["id"], "displacement-graph");
    }
}
