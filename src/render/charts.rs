//! Plotly figures built from an [`AnalysisResult`] already held in state.
//! Nothing here talks to the backend.

use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::two_decimals;
use crate::error::AppError;
use crate::models::{AnalysisResult, Distribution, UploadedFile};

const PIE_COLORS: [&str; 6] = [
    "rgba(255, 99, 132, 0.7)",
    "rgba(54, 162, 235, 0.7)",
    "rgba(255, 206, 86, 0.7)",
    "rgba(75, 192, 192, 0.7)",
    "rgba(153, 102, 255, 0.7)",
    "rgba(255, 159, 64, 0.7)",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Heatmap,
    Histogram,
    Scatter,
    Bar,
    Pie,
}

impl ChartKind {
    pub fn container_id(self) -> &'static str {
        match self {
            ChartKind::Heatmap => "heatmap-container",
            ChartKind::Histogram => "histogram-container",
            ChartKind::Scatter => "scatter-container",
            ChartKind::Bar => "barchart-container",
            ChartKind::Pie => "piechart-container",
        }
    }
}

impl FromStr for ChartKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "heatmap" => Ok(ChartKind::Heatmap),
            "histogram" => Ok(ChartKind::Histogram),
            "scatter" => Ok(ChartKind::Scatter),
            "bar" => Ok(ChartKind::Bar),
            "pie" => Ok(ChartKind::Pie),
            other => Err(AppError::validation(format!("Unknown chart type {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Figure {
    pub data: Vec<Value>,
    pub layout: Value,
}

/// Options of the five chart selectors, in result order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Selectors {
    pub histogram: Vec<String>,
    pub scatter_x: Vec<String>,
    pub scatter_y: Vec<String>,
    pub bar: Vec<String>,
    pub pie: Vec<String>,
}

impl Selectors {
    pub fn from_result(result: &AnalysisResult) -> Self {
        Self {
            histogram: result.numeric_cols.clone(),
            scatter_x: result.numeric_cols.clone(),
            scatter_y: result.numeric_cols.clone(),
            bar: result.cat_cols.clone(),
            pie: result.cat_cols.clone(),
        }
    }
}

/// The charts drawn right after an analysis, with the column each selector
/// starts on.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSet {
    pub selectors: Selectors,
    pub heatmap: Figure,
    pub histogram: Option<(String, Figure)>,
    pub scatter: Option<((String, String), Figure)>,
    pub bar: Option<(String, Figure)>,
    pub pie: Option<(String, Figure)>,
}

pub fn initial_charts(files: &[UploadedFile], result: &AnalysisResult) -> ChartSet {
    let first_numeric = result.numeric_cols.first();
    let first_categorical = result.cat_cols.first();

    let histogram = first_numeric.and_then(|col| {
        let figure = result.distributions.get(col).map(|d| histogram(col, d));
        if figure.is_none() {
            tracing::warn!("No distribution reported for {}", col);
        }
        figure.map(|f| (col.clone(), f))
    });

    let scatter = first_numeric.map(|x| {
        let y = result.numeric_cols.get(1).unwrap_or(x);
        ((x.clone(), y.clone()), scatter(files, x, y))
    });

    let bar = first_categorical.and_then(|col| {
        result
            .categorical
            .get(col)
            .map(|summary| (col.clone(), bar(&summary.counts)))
    });

    let pie = first_categorical.and_then(|col| {
        result
            .categorical
            .get(col)
            .map(|summary| (col.clone(), pie(&summary.proportions)))
    });

    ChartSet {
        selectors: Selectors::from_result(result),
        heatmap: heatmap(result),
        histogram,
        scatter,
        bar,
        pie,
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChartQuery {
    pub column: Option<String>,
    pub x: Option<String>,
    pub y: Option<String>,
}

/// Redraws one chart after its selector changed.
pub fn rerender(
    kind: ChartKind,
    query: &ChartQuery,
    files: &[UploadedFile],
    result: &AnalysisResult,
) -> Result<Figure, AppError> {
    match kind {
        ChartKind::Heatmap => Ok(heatmap(result)),
        ChartKind::Histogram => {
            let column = numeric_column(result, query.column.as_deref())?;
            let distribution = result.distributions.get(column).ok_or_else(|| {
                AppError::validation(format!("No distribution available for {}", column))
            })?;
            Ok(histogram(column, distribution))
        }
        ChartKind::Scatter => {
            let x = numeric_column(result, query.x.as_deref())?;
            let y = numeric_column(result, query.y.as_deref())?;
            Ok(scatter(files, x, y))
        }
        ChartKind::Bar | ChartKind::Pie => {
            let column = query
                .column
                .as_deref()
                .filter(|c| result.cat_cols.iter().any(|known| known == c))
                .ok_or_else(|| AppError::validation("Unknown categorical column"))?;
            let summary = result.categorical.get(column).ok_or_else(|| {
                AppError::validation(format!("No category counts available for {}", column))
            })?;
            Ok(if kind == ChartKind::Bar {
                bar(&summary.counts)
            } else {
                pie(&summary.proportions)
            })
        }
    }
}

fn numeric_column<'a>(result: &'a AnalysisResult, column: Option<&str>) -> Result<&'a str, AppError> {
    column
        .and_then(|c| result.numeric_cols.iter().find(|known| *known == c))
        .map(String::as_str)
        .ok_or_else(|| AppError::validation("Unknown numeric column"))
}

/// Square correlation matrix over the numeric columns, annotated per cell.
pub fn heatmap(result: &AnalysisResult) -> Figure {
    let columns = &result.numeric_cols;

    let z: Vec<Vec<Option<f64>>> = columns
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|col| result.correlation_between(row, col))
                .collect()
        })
        .collect();

    let mut annotations = Vec::with_capacity(columns.len() * columns.len());
    for (i, row) in columns.iter().enumerate() {
        for (j, col) in columns.iter().enumerate() {
            let value = z[i][j];
            let color = match value {
                Some(v) if v.abs() > 0.5 => "white",
                _ => "black",
            };
            annotations.push(json!({
                "x": col,
                "y": row,
                "text": two_decimals(value),
                "font": {"color": color},
                "showarrow": false
            }));
        }
    }

    Figure {
        data: vec![json!({
            "z": z,
            "x": columns,
            "y": columns,
            "type": "heatmap",
            "colorscale": "Viridis",
            "zmin": -1,
            "zmax": 1
        })],
        layout: json!({
            "title": "Correlation Matrix",
            "annotations": annotations,
            "xaxis": {"side": "bottom"},
            "yaxis": {"autorange": "reversed"},
            "margin": {"t": 50, "l": 100}
        }),
    }
}

pub fn histogram(column: &str, distribution: &Distribution) -> Figure {
    // Bars sit at bin centres when the backend sends edges (n + 1 for n counts).
    let x: Vec<f64> = if distribution.bins.len() == distribution.hist.len() + 1 {
        distribution
            .bins
            .windows(2)
            .map(|edge| (edge[0] + edge[1]) / 2.0)
            .collect()
    } else {
        distribution.bins.clone()
    };

    Figure {
        data: vec![json!({
            "x": x,
            "y": distribution.hist,
            "type": "bar",
            "marker": {
                "color": "rgba(55, 128, 191, 0.7)",
                "line": {"color": "rgba(55, 128, 191, 1)", "width": 1}
            }
        })],
        layout: json!({
            "title": format!("Distribution of {}", column),
            "bargap": 0.05,
            "xaxis": {"title": "Value"},
            "yaxis": {"title": "Frequency"}
        }),
    }
}

/// Plots the preview rows of every file in the batch where both cells are
/// numeric.
pub fn scatter(files: &[UploadedFile], x_col: &str, y_col: &str) -> Figure {
    let (xs, ys): (Vec<f64>, Vec<f64>) = files
        .iter()
        .flat_map(|file| file.preview.iter())
        .filter_map(|row| {
            let x = row.get(x_col)?.as_f64()?;
            let y = row.get(y_col)?.as_f64()?;
            Some((x, y))
        })
        .unzip();

    Figure {
        data: vec![json!({
            "x": xs,
            "y": ys,
            "mode": "markers",
            "type": "scatter",
            "marker": {
                "size": 12,
                "color": "rgba(156, 165, 196, 0.8)",
                "line": {"width": 1, "color": "rgba(156, 165, 196, 1)"}
            }
        })],
        layout: json!({
            "title": format!("{} vs {}", x_col, y_col),
            "xaxis": {"title": x_col},
            "yaxis": {"title": y_col},
            "hovermode": "closest"
        }),
    }
}

pub fn bar(counts: &IndexMap<String, u64>) -> Figure {
    Figure {
        data: vec![json!({
            "x": counts.keys().collect::<Vec<_>>(),
            "y": counts.values().collect::<Vec<_>>(),
            "type": "bar",
            "marker": {
                "color": "rgba(75, 192, 192, 0.7)",
                "line": {"color": "rgba(75, 192, 192, 1)", "width": 1}
            }
        })],
        layout: json!({
            "title": "Category Counts",
            "xaxis": {"title": "Category"},
            "yaxis": {"title": "Count"}
        }),
    }
}

pub fn pie(proportions: &IndexMap<String, f64>) -> Figure {
    Figure {
        data: vec![json!({
            "labels": proportions.keys().collect::<Vec<_>>(),
            "values": proportions.values().collect::<Vec<_>>(),
            "type": "pie",
            "textinfo": "label+percent",
            "hoverinfo": "label+percent+value",
            "marker": {"colors": PIE_COLORS}
        })],
        layout: json!({
            "title": "Category Proportions",
            "showlegend": true
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result() -> AnalysisResult {
        serde_json::from_value(json!({
            "numeric_cols": ["a", "b"],
            "cat_cols": ["city"],
            "stats": {},
            "correlation": {
                "a": {"a": 1.0, "b": -0.73},
                "b": {"a": -0.73, "b": 1.0}
            },
            "distributions": {
                "a": {"bins": [0.0, 1.0, 2.0], "hist": [3, 4]},
                "b": {"bins": [10.0, 20.0, 30.0, 40.0], "hist": [1, 0, 5]}
            },
            "categorical": {
                "city": {"counts": {"Oslo": 2, "Lima": 1},
                         "proportions": {"Oslo": 0.6667, "Lima": 0.3333}}
            }
        }))
        .unwrap()
    }

    fn files() -> Vec<UploadedFile> {
        serde_json::from_value(json!([
            {"filename": "one.csv", "shape": [3, 2], "columns": ["a", "b"],
             "preview": [{"a": 1, "b": 2.5}, {"a": "NaN", "b": 3}, {"a": 4, "b": 8}]},
            {"filename": "two.csv", "shape": [1, 1], "columns": ["a"],
             "preview": [{"a": 9}]}
        ]))
        .unwrap()
    }

    #[test]
    fn heatmap_is_square_and_symmetric() {
        let figure = heatmap(&result());
        let z = figure.data[0]["z"].as_array().unwrap();
        assert_eq!(z.len(), 2);
        assert!(z.iter().all(|row| row.as_array().unwrap().len() == 2));
        assert_eq!(z[0][1], z[1][0]);
        assert_eq!(figure.data[0]["zmin"], -1);
        assert_eq!(figure.data[0]["zmax"], 1);
        assert_eq!(figure.data[0]["colorscale"], "Viridis");

        let annotations = figure.layout["annotations"].as_array().unwrap();
        assert_eq!(annotations.len(), 4);
        assert_eq!(annotations[0]["text"], "1.00");
        assert_eq!(annotations[3]["text"], "1.00");
        assert_eq!(annotations[1]["text"], "-0.73");
        assert_eq!(annotations[1]["font"]["color"], "white");
    }

    #[test]
    fn weak_and_missing_correlations_use_dark_text() {
        let mut result = result();
        result.correlation["a"]["b"] = Some(0.5);
        result.correlation["b"].shift_remove("a");
        let figure = heatmap(&result);
        let annotations = figure.layout["annotations"].as_array().unwrap();
        assert_eq!(annotations[1]["text"], "0.50");
        assert_eq!(annotations[1]["font"]["color"], "black");
        assert_eq!(annotations[2]["text"], "N/A");
        assert!(figure.data[0]["z"][1][0].is_null());
    }

    #[test]
    fn initial_set_uses_first_columns() {
        let set = initial_charts(&files(), &result());
        assert_eq!(set.selectors.histogram, vec!["a", "b"]);
        assert_eq!(set.selectors.pie, vec!["city"]);
        assert_eq!(set.histogram.as_ref().unwrap().0, "a");
        assert_eq!(set.scatter.as_ref().unwrap().0, ("a".to_string(), "b".to_string()));
        assert_eq!(set.bar.as_ref().unwrap().0, "city");
        assert_eq!(set.pie.as_ref().unwrap().0, "city");
    }

    #[test]
    fn single_numeric_column_scatters_against_itself() {
        let mut result = result();
        result.numeric_cols.truncate(1);
        result.cat_cols.clear();
        let set = initial_charts(&files(), &result);
        assert_eq!(set.scatter.unwrap().0, ("a".to_string(), "a".to_string()));
        assert!(set.bar.is_none());
        assert!(set.pie.is_none());
    }

    #[test]
    fn no_numeric_columns_still_draws_heatmap() {
        let mut result = result();
        result.numeric_cols.clear();
        let set = initial_charts(&files(), &result);
        assert!(set.histogram.is_none());
        assert!(set.scatter.is_none());
        assert_eq!(set.heatmap.data[0]["z"], json!([]));
    }

    #[test]
    fn histogram_rerender_uses_held_distribution() {
        let query = ChartQuery {
            column: Some("b".into()),
            ..Default::default()
        };
        let figure = rerender(ChartKind::Histogram, &query, &files(), &result()).unwrap();
        assert_eq!(figure.data[0]["y"], json!([1, 0, 5]));
        assert_eq!(figure.data[0]["x"], json!([15.0, 25.0, 35.0]));
        assert_eq!(figure.layout["title"], "Distribution of b");
    }

    #[test]
    fn rerender_rejects_unknown_columns() {
        let query = ChartQuery {
            column: Some("city".into()),
            ..Default::default()
        };
        assert!(rerender(ChartKind::Histogram, &query, &files(), &result()).is_err());
        assert!(rerender(ChartKind::Bar, &ChartQuery::default(), &files(), &result()).is_err());
    }

    #[test]
    fn scatter_pairs_real_preview_rows() {
        let figure = scatter(&files(), "a", "b");
        assert_eq!(figure.data[0]["x"], json!([1.0, 4.0]));
        assert_eq!(figure.data[0]["y"], json!([2.5, 8.0]));
        assert_eq!(figure.layout["title"], "a vs b");
    }

    #[test]
    fn bar_and_pie_keep_category_order() {
        let query = ChartQuery {
            column: Some("city".into()),
            ..Default::default()
        };
        let bar = rerender(ChartKind::Bar, &query, &files(), &result()).unwrap();
        assert_eq!(bar.data[0]["x"], json!(["Oslo", "Lima"]));
        assert_eq!(bar.data[0]["y"], json!([2, 1]));
        let pie = rerender(ChartKind::Pie, &query, &files(), &result()).unwrap();
        assert_eq!(pie.data[0]["labels"], json!(["Oslo", "Lima"]));
        assert_eq!(pie.data[0]["type"], "pie");
    }

    #[test]
    fn chart_kinds_parse() {
        assert_eq!("scatter".parse::<ChartKind>().unwrap(), ChartKind::Scatter);
        assert!("radar".parse::<ChartKind>().is_err());
    }
}
