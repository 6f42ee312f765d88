//! Dashboard page served at `/`.
//!
//! Kept as a `&'static str` so the binary needs no asset directory. The script
//! forwards the map's mount and click events to `/_dash-update-component` and
//! applies the returned figures and styles.

pub const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Displacement dashboard</title>
  <script src="https://cdn.plot.ly/plotly-2.35.2.min.js" charset="utf-8"></script>
  <style>
    body { margin: 0; font-family: sans-serif; }
  </style>
</head>
<body>
  <div id="dashboard">
    <div id="map"></div>
    <div id="displacement-container" style="display: none">
      <div id="displacement-graph"></div>
    </div>
  </div>
  <script>
    async function dispatch(id, property, value) {
      const res = await fetch("/_dash-update-component", {
        method: "POST",
        headers: { "Content-Type": "application/json" },
        body: JSON.stringify({ inputs: [{ id, property, value }] }),
      });
      const body = await res.json();
      if (!res.ok) {
        console.error("update failed", body.error);
        return;
      }
      const updates = Object.entries(body.response);
      // styles first so graphs are laid out inside a visible container
      for (const [target, props] of updates) {
        if (props.style) Object.assign(document.getElementById(target).style, props.style);
      }
      for (const [target, props] of updates) {
        if (props.figure) {
          const fig = props.figure;
          await Plotly.react(target, fig.data || [], fig.layout || {});
        }
      }
    }

    (async () => {
      await dispatch("map", "id", "map");
      document.getElementById("map").on("plotly_click", (ev) => {
        const points = ev.points.map((p) => ({
          hovertext: p.hovertext,
          lat: p.lat,
          lon: p.lon,
          curveNumber: p.curveNumber,
          pointNumber: p.pointNumber,
        }));
        dispatch("map", "clickData", { points });
      });
    })();
  </script>
</body>
</html>
"#;
