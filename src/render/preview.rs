use std::fmt::Write;

use super::escape_text;
use crate::models::UploadedFile;

/// One summary card per file: name, shape badge, columns with gaps.
pub fn file_list(files: &[UploadedFile]) -> String {
    let mut html = String::new();
    for file in files {
        let _ = write!(
            html,
            r#"<div class="file-item mb-2 p-2 border rounded">
  <div class="d-flex justify-content-between">
    <span>{name}</span>
    <span class="badge bg-primary">{rows} rows × {cols} cols</span>
  </div>
  <div class="mt-2"><small class="text-muted">Missing values: {missing} columns</small></div>
</div>
"#,
            name = escape_text(&file.filename),
            rows = file.shape.rows,
            cols = file.shape.cols,
            missing = file.columns_with_missing(),
        );
    }
    html
}

/// Tab strip plus one table panel per file. The first tab starts active.
pub fn previews(files: &[UploadedFile]) -> String {
    let mut nav = String::from(r#"<ul class="nav nav-tabs" id="preview-tabs" role="tablist">"#);
    let mut panes = String::from(r#"<div class="tab-content" id="preview-tab-content">"#);

    for (index, file) in files.iter().enumerate() {
        let active = index == 0;
        let tab_id = format!("preview-tab-{}", index);
        let content_id = format!("preview-content-{}", index);

        let _ = write!(
            nav,
            r##"<li class="nav-item"><a class="nav-link{active}" id="{tab_id}-tab" data-bs-toggle="tab" href="#{content_id}" role="tab" aria-controls="{content_id}" aria-selected="{selected}">{name}</a></li>"##,
            active = if active { " active" } else { "" },
            selected = active,
            name = escape_text(&file.filename),
        );

        let _ = write!(
            panes,
            r#"<div class="tab-pane fade{shown}" id="{content_id}" role="tabpanel" aria-labelledby="{tab_id}-tab">{table}</div>"#,
            shown = if active { " show active" } else { "" },
            table = preview_table(file),
        );
    }

    nav.push_str("</ul>");
    panes.push_str("</div>");
    nav + &panes
}

fn preview_table(file: &UploadedFile) -> String {
    let mut html =
        String::from(r#"<table class="table table-striped table-bordered table-hover"><thead><tr>"#);
    for column in &file.columns {
        let _ = write!(html, "<th>{}</th>", escape_text(column));
    }
    html.push_str("</tr></thead><tbody>");

    for row in &file.preview {
        html.push_str("<tr>");
        for column in &file.columns {
            match row.get(column) {
                Some(cell) if !cell.is_missing() => {
                    let _ = write!(html, "<td>{}</td>", escape_text(&cell.to_string()));
                }
                // Absent keys are treated like the sentinel.
                _ => html.push_str(r#"<td class="text-danger">N/A</td>"#),
            }
        }
        html.push_str("</tr>");
    }

    html.push_str("</tbody></table>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Vec<UploadedFile> {
        serde_json::from_value(json!([
            {"filename": "people.csv", "shape": [2, 2], "columns": ["name", "age"],
             "missing_values": {"name": 0, "age": 1},
             "preview": [{"name": "Ann", "age": 31}, {"name": "<Bo>", "age": "NaN"}]},
            {"filename": "cities.csv", "shape": [1, 1], "columns": ["city"],
             "missing_values": {"city": 0},
             "preview": [{"city": "Oslo"}]}
        ]))
        .unwrap()
    }

    #[test]
    fn first_tab_active_only() {
        let html = previews(&sample());
        assert_eq!(html.matches(r#"class="nav-link active""#).count(), 1);
        assert!(html.contains(r#"id="preview-tab-0-tab""#));
        assert!(html.contains(r#"class="tab-pane fade show active" id="preview-content-0""#));
        assert!(html.contains(r#"class="tab-pane fade" id="preview-content-1""#));
    }

    #[test]
    fn missing_cells_are_flagged_not_echoed() {
        let html = previews(&sample());
        assert!(html.contains(r#"<td class="text-danger">N/A</td>"#));
        assert!(!html.contains(">NaN<"));
        assert!(html.contains("<td>&lt;Bo&gt;</td>"));
        assert!(html.contains("<th>name</th><th>age</th>"));
    }

    #[test]
    fn rendering_twice_yields_the_same_fragment() {
        let files = sample();
        assert_eq!(previews(&files), previews(&files));
        assert_eq!(previews(&files[1..]).matches("tab-pane").count(), 1);
    }

    #[test]
    fn file_list_summarises_shape_and_gaps() {
        let html = file_list(&sample());
        assert!(html.contains("2 rows × 2 cols"));
        assert!(html.contains("Missing values: 1 columns"));
        assert!(html.contains("Missing values: 0 columns"));
    }
}
