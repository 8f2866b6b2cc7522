use std::fmt::Write;

use serde_json::{json, Value};

use super::charts::{initial_charts, ChartKind, ChartSet};
use super::columns::column_selection;
use super::preview::{file_list, previews};
use super::stats::stats_table;
use super::escape_text;
use crate::state::ViewState;

const PAGE_SCRIPT: &str = r#"
(function () {
  const dropArea = document.getElementById('drop-area');
  const uploadForm = document.getElementById('upload-form');
  const fileInput = document.getElementById('fileInput');
  const source = document.getElementById('upload-source');
  ['dragenter', 'dragover', 'dragleave', 'drop'].forEach(function (name) {
    dropArea.addEventListener(name, function (e) { e.preventDefault(); e.stopPropagation(); });
  });
  ['dragenter', 'dragover'].forEach(function (name) {
    dropArea.addEventListener(name, function () { dropArea.classList.add('highlight'); });
  });
  ['dragleave', 'drop'].forEach(function (name) {
    dropArea.addEventListener(name, function () { dropArea.classList.remove('highlight'); });
  });
  dropArea.addEventListener('drop', function (e) {
    if (e.dataTransfer.files.length === 0) return;
    fileInput.files = e.dataTransfer.files;
    source.value = 'drop';
    uploadForm.submit();
  });
  fileInput.addEventListener('change', function () {
    if (fileInput.files.length === 0) return;
    source.value = 'picker';
    uploadForm.submit();
  });

  const figuresNode = document.getElementById('initial-figures');
  if (!figuresNode) return;
  const figures = JSON.parse(figuresNode.textContent);
  Object.keys(figures).forEach(function (id) {
    const figure = figures[id];
    if (figure) Plotly.newPlot(id, figure.data, figure.layout);
  });

  function redraw(kind, container, params) {
    fetch('/charts/' + kind + '?' + new URLSearchParams(params))
      .then(function (response) { return response.json(); })
      .then(function (figure) {
        if (figure.error) { alert(figure.error); return; }
        Plotly.newPlot(container, figure.data, figure.layout);
      })
      .catch(function () { alert('Error rendering chart'); });
  }

  function onChange(id, handler) {
    const node = document.getElementById(id);
    if (node) node.addEventListener('change', handler);
  }
  const value = function (id) { return document.getElementById(id).value; };
  onChange('histogram-select', function () {
    redraw('histogram', 'histogram-container', { column: value('histogram-select') });
  });
  const scatter = function () {
    redraw('scatter', 'scatter-container', { x: value('scatter-x'), y: value('scatter-y') });
  };
  onChange('scatter-x', scatter);
  onChange('scatter-y', scatter);
  onChange('barchart-select', function () {
    redraw('bar', 'barchart-container', { column: value('barchart-select') });
  });
  onChange('piechart-select', function () {
    redraw('pie', 'piechart-container', { column: value('piechart-select') });
  });
})();
"#;

/// The whole dashboard for one view state, with an optional notification.
pub fn render(state: &ViewState, notice: Option<&str>) -> String {
    let mut body = String::new();

    if let Some(message) = notice {
        let _ = write!(
            body,
            r#"<div class="alert alert-danger" role="alert" id="notice">{}</div>"#,
            escape_text(message)
        );
    }

    body.push_str(UPLOAD_CARD);

    if let Some(batch) = state.batch() {
        let _ = write!(
            body,
            r#"<div class="card mb-4"><div class="card-body"><div id="file-list">{}</div></div></div>"#,
            file_list(&batch.files)
        );
        let _ = write!(
            body,
            r#"<section id="preview-section" class="mb-4"><h2>Data Preview</h2>{}</section>"#,
            previews(&batch.files)
        );
        let _ = write!(
            body,
            r#"<section id="column-selection-card" class="card mb-4"><div class="card-body"><h2>Select Columns</h2>{}</div></section>"#,
            column_selection(&batch.universe, state.selected())
        );
    }

    if let (Some(batch), Some(analysis)) = (state.batch(), state.analysis()) {
        let _ = write!(
            body,
            r#"<section id="stats-section" class="mb-4"><h2>Summary Statistics</h2>{}</section>"#,
            stats_table(&analysis.result)
        );
        let charts = initial_charts(&batch.files, &analysis.result);
        body.push_str(&visualization_section(&charts));
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>CSV Data Visualizer</title>
<link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/bootstrap@5.3.0/dist/css/bootstrap.min.css">
<script src="https://cdn.plot.ly/plotly-2.27.0.min.js"></script>
<script src="https://cdn.jsdelivr.net/npm/bootstrap@5.3.0/dist/js/bootstrap.bundle.min.js"></script>
</head>
<body data-phase="{phase}">
<main class="container py-4">
<h1 class="mb-4">CSV Data Visualizer</h1>
{body}
</main>
<script>{script}</script>
</body>
</html>"#,
        phase = state.phase_name(),
        body = body,
        script = PAGE_SCRIPT,
    )
}

const UPLOAD_CARD: &str = r#"<div class="card mb-4"><div class="card-body">
<form id="upload-form" method="post" action="/upload" enctype="multipart/form-data">
<div id="drop-area" class="p-5 border border-2 rounded text-center">
<p>Drag and drop CSV files here, or</p>
<input type="file" id="fileInput" name="files[]" accept=".csv" multiple>
<input type="hidden" id="upload-source" name="source" value="picker">
</div>
</form>
</div></div>"#;

fn visualization_section(charts: &ChartSet) -> String {
    let mut html = String::from(r#"<section id="visualization-section" class="row g-4">"#);

    html.push_str(&chart_card(ChartKind::Heatmap, "Correlation Heatmap", ""));

    let histogram = select(
        "histogram-select",
        &charts.selectors.histogram,
        charts.histogram.as_ref().map(|(c, _)| c.as_str()),
    );
    html.push_str(&chart_card(ChartKind::Histogram, "Histogram", &histogram));

    let (scatter_x, scatter_y) = match &charts.scatter {
        Some(((x, y), _)) => (Some(x.as_str()), Some(y.as_str())),
        None => (None, None),
    };
    let scatter = select("scatter-x", &charts.selectors.scatter_x, scatter_x)
        + &select("scatter-y", &charts.selectors.scatter_y, scatter_y);
    html.push_str(&chart_card(ChartKind::Scatter, "Scatter Plot", &scatter));

    let bar = select(
        "barchart-select",
        &charts.selectors.bar,
        charts.bar.as_ref().map(|(c, _)| c.as_str()),
    );
    html.push_str(&chart_card(ChartKind::Bar, "Bar Chart", &bar));

    let pie = select(
        "piechart-select",
        &charts.selectors.pie,
        charts.pie.as_ref().map(|(c, _)| c.as_str()),
    );
    html.push_str(&chart_card(ChartKind::Pie, "Pie Chart", &pie));

    let figures: serde_json::Map<String, Value> = [
        (ChartKind::Heatmap, json!(charts.heatmap)),
        (ChartKind::Histogram, json!(charts.histogram.as_ref().map(|(_, f)| f))),
        (ChartKind::Scatter, json!(charts.scatter.as_ref().map(|(_, f)| f))),
        (ChartKind::Bar, json!(charts.bar.as_ref().map(|(_, f)| f))),
        (ChartKind::Pie, json!(charts.pie.as_ref().map(|(_, f)| f))),
    ]
    .into_iter()
    .map(|(kind, figure)| (kind.container_id().to_string(), figure))
    .collect();
    // Keep `</script>` inside a string from closing the tag.
    let _ = write!(
        html,
        r#"<script type="application/json" id="initial-figures">{}</script>"#,
        Value::Object(figures).to_string().replace("</", "<\\/")
    );

    html.push_str("</section>");
    html
}

fn chart_card(kind: ChartKind, title: &str, controls: &str) -> String {
    format!(
        r#"<div class="col-md-6"><div class="card"><div class="card-body"><h3>{title}</h3>{controls}<div id="{id}"></div></div></div></div>"#,
        id = kind.container_id(),
    )
}

fn select(id: &str, options: &[String], current: Option<&str>) -> String {
    let mut html = format!(r#"<select class="form-select mb-2" id="{}">"#, id);
    for option in options {
        let selected = if current == Some(option.as_str()) { " selected" } else { "" };
        let option = escape_text(option);
        let _ = write!(html, r#"<option value="{option}"{selected}>{option}</option>"#);
    }
    html.push_str("</select>");
    html
}
