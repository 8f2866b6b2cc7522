use std::fmt::Write;

use super::{escape_text, two_decimals};
use crate::models::{AnalysisResult, Statistic};

/// Statistic × numeric-column grid. Absent values render as `N/A`.
pub fn stats_table(result: &AnalysisResult) -> String {
    let mut html = String::from(
        r#"<table class="table table-bordered" id="stats-table"><thead><tr><th>Statistic</th>"#,
    );
    for column in &result.numeric_cols {
        let _ = write!(html, "<th>{}</th>", escape_text(column));
    }
    html.push_str("</tr></thead><tbody>");

    for stat in Statistic::ALL {
        let _ = write!(html, "<tr><td>{}</td>", stat.label());
        for column in &result.numeric_cols {
            let value = result.stats.get(column).and_then(|s| s.get(stat));
            if value.is_none() {
                tracing::warn!("No {} reported for column {}", stat.label(), column);
            }
            let _ = write!(html, "<td>{}</td>", two_decimals(value));
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

    fn result() -> AnalysisResult {
        serde_json::from_value(json!({
            "numeric_cols": ["age", "income"],
            "cat_cols": ["city"],
            "stats": {
                "age": {"mean": 30.333, "median": 29.0, "std": 4.5678, "min": 22.0, "max": 41.0},
                "income": {"mean": 51234.5, "median": 50000.0, "std": 1000.0, "min": 100.0}
            }
        }))
        .unwrap()
    }

    #[test]
    fn header_and_five_rows() {
        let html = stats_table(&result());
        assert!(html.contains("<tr><th>Statistic</th><th>age</th><th>income</th></tr>"));
        assert_eq!(html.matches("<tr><td>").count(), 5);
        for label in ["Mean", "Median", "Std", "Min", "Max"] {
            assert!(html.contains(&format!("<tr><td>{}</td>", label)));
        }
    }

    #[test]
    fn mean_is_rounded_to_two_decimals() {
        let html = stats_table(&result());
        assert!(html.contains("<tr><td>Mean</td><td>30.33</td><td>51234.50</td></tr>"));
        assert!(html.contains("<tr><td>Std</td><td>4.57</td><td>1000.00</td></tr>"));
    }

    #[test]
    fn absent_values_render_na() {
        let html = stats_table(&result());
        assert!(html.contains("<tr><td>Max</td><td>41.00</td><td>N/A</td></tr>"));

        let mut missing_column = result();
        missing_column.stats.shift_remove("age");
        let html = stats_table(&missing_column);
        assert!(html.contains("<tr><td>Mean</td><td>N/A</td><td>51234.50</td></tr>"));
    }
}
