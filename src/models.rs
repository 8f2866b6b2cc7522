use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Marker the backend writes into preview cells that had no value.
pub const MISSING_SENTINEL: &str = "NaN";

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Missing,
    Text(String),
    Number(serde_json::Number),
    Bool(bool),
}

impl CellValue {
    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }

    /// Numeric reading of the cell, accepting numeric text as well.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => n.as_f64(),
            CellValue::Text(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            CellValue::Missing | CellValue::Bool(_) => None,
        }
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Missing => write!(f, "N/A"),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Number(n) => match n.as_f64() {
                // Whole floats print bare, as the page always showed them.
                Some(v) if n.is_f64() && v.fract() == 0.0 && v.abs() < 1e21 => {
                    if v == 0.0 {
                        write!(f, "0")
                    } else {
                        write!(f, "{:.0}", v)
                    }
                }
                _ => write!(f, "{}", n),
            },
            CellValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<Value> for CellValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => CellValue::Missing,
            Value::String(s) if s == MISSING_SENTINEL => CellValue::Missing,
            Value::String(s) => CellValue::Text(s),
            Value::Number(n) => CellValue::Number(n),
            Value::Bool(b) => CellValue::Bool(b),
            other => CellValue::Text(other.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for CellValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Value::deserialize(deserializer).map(CellValue::from)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "(usize, usize)")]
pub struct Shape {
    pub rows: usize,
    pub cols: usize,
}

impl From<(usize, usize)> for Shape {
    fn from((rows, cols): (usize, usize)) -> Self {
        Shape { rows, cols }
    }
}

pub type PreviewRow = IndexMap<String, CellValue>;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UploadedFile {
    pub filename: String,
    pub shape: Shape,
    pub columns: Vec<String>,
    #[serde(default)]
    pub missing_values: IndexMap<String, u64>,
    #[serde(default)]
    pub preview: Vec<PreviewRow>,
}

impl UploadedFile {
    /// Number of columns with at least one absent value.
    pub fn columns_with_missing(&self) -> usize {
        self.missing_values.values().filter(|&&count| count > 0).count()
    }
}

#[derive(Debug, Deserialize)]
pub struct UploadResponse {
    pub files: Vec<UploadedFile>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyzeRequest {
    pub files: Vec<String>,
    pub columns: Vec<String>,
}

/// The five summary statistics, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Statistic {
    Mean,
    Median,
    Std,
    Min,
    Max,
}

impl Statistic {
    pub const ALL: [Statistic; 5] = [
        Statistic::Mean,
        Statistic::Median,
        Statistic::Std,
        Statistic::Min,
        Statistic::Max,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Statistic::Mean => "Mean",
            Statistic::Median => "Median",
            Statistic::Std => "Std",
            Statistic::Min => "Min",
            Statistic::Max => "Max",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ColumnStats {
    #[serde(default)]
    pub mean: Option<f64>,
    #[serde(default)]
    pub median: Option<f64>,
    #[serde(default)]
    pub std: Option<f64>,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

impl ColumnStats {
    pub fn get(&self, stat: Statistic) -> Option<f64> {
        match stat {
            Statistic::Mean => self.mean,
            Statistic::Median => self.median,
            Statistic::Std => self.std,
            Statistic::Min => self.min,
            Statistic::Max => self.max,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Distribution {
    pub bins: Vec<f64>,
    pub hist: Vec<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CategoricalSummary {
    pub counts: IndexMap<String, u64>,
    pub proportions: IndexMap<String, f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AnalysisResult {
    #[serde(default)]
    pub numeric_cols: Vec<String>,
    #[serde(default)]
    pub cat_cols: Vec<String>,
    #[serde(default)]
    pub stats: IndexMap<String, ColumnStats>,
    #[serde(default)]
    pub correlation: IndexMap<String, IndexMap<String, Option<f64>>>,
    #[serde(default)]
    pub distributions: IndexMap<String, Distribution>,
    #[serde(default)]
    pub categorical: IndexMap<String, CategoricalSummary>,
}

impl AnalysisResult {
    pub fn correlation_between(&self, a: &str, b: &str) -> Option<f64> {
        self.correlation.get(a).and_then(|row| row.get(b)).copied().flatten()
    }

    /// A column may be numeric or categorical, never both.
    pub fn check_disjoint(&self) -> Result<(), String> {
        match self.numeric_cols.iter().find(|c| self.cat_cols.contains(c)) {
            Some(col) => Err(format!(
                "Column {} was classified as both numeric and categorical",
                col
            )),
            None => Ok(()),
        }
    }
}
