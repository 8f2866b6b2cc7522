use std::fmt::Write;

use super::escape_text;
use crate::services::selection::{ColumnUniverse, SelectedColumns};

/// One checkbox per column in the universe, pre-checked from `selected`.
pub fn column_selection(universe: &ColumnUniverse, selected: Option<&SelectedColumns>) -> String {
    let mut html = String::from(r#"<form method="post" action="/analyze" id="column-selection">"#);
    if universe.is_empty() {
        html.push_str(r#"<p class="text-muted">The uploaded files have no columns.</p>"#);
    }

    for (id, name) in universe.toggles() {
        let checked = selected.is_some_and(|s| s.contains(name));
        let name = escape_text(name);
        let _ = write!(
            html,
            r#"<div class="form-check"><input class="form-check-input" type="checkbox" name="{id}" value="{name}" id="{id}"{checked}><label class="form-check-label" for="{id}">{name}</label></div>"#,
            checked = if checked { " checked" } else { "" },
        );
    }

    html.push_str(r#"<button type="submit" class="btn btn-primary mt-3" id="analyze-btn">Analyze</button></form>"#);
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Shape, UploadedFile};

    fn universe(columns: &[&str]) -> ColumnUniverse {
        ColumnUniverse::from_files(&[UploadedFile {
            filename: "a.csv".into(),
            shape: Shape { rows: 0, cols: columns.len() },
            columns: columns.iter().map(|c| c.to_string()).collect(),
            missing_values: Default::default(),
            preview: vec![],
        }])
    }

    #[test]
    fn one_toggle_per_column_with_unique_ids() {
        let html = column_selection(&universe(&["a b", "a_b"]), None);
        assert_eq!(html.matches(r#"type="checkbox""#).count(), 2);
        assert!(html.contains(r#"name="col-0" value="a b" id="col-0""#));
        assert!(html.contains(r#"name="col-1" value="a_b" id="col-1""#));
        assert!(!html.contains(" checked"));
    }

    #[test]
    fn prior_selection_is_restored() {
        let selected = SelectedColumns::new(vec!["y".into()]).unwrap();
        let html = column_selection(&universe(&["x", "y"]), Some(&selected));
        assert!(html.contains(r#"id="col-1" checked>"#));
        assert!(html.contains(r#"id="col-0">"#));
    }
}
