use indexmap::IndexSet;

use crate::error::AppError;
use crate::models::UploadedFile;

const TOGGLE_PREFIX: &str = "col-";

/// Every column of every file in the batch, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnUniverse {
    columns: IndexSet<String>,
}

impl ColumnUniverse {
    pub fn from_files(files: &[UploadedFile]) -> Self {
        let columns = files
            .iter()
            .flat_map(|file| file.columns.iter().cloned())
            .collect();
        Self { columns }
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(String::as_str)
    }

    /// Toggle ids are namespaced by position, never derived from the name,
    /// so `a b` and `a_b` cannot collide.
    pub fn toggles(&self) -> impl Iterator<Item = (String, &str)> {
        self.iter()
            .enumerate()
            .map(|(index, name)| (toggle_id(index), name))
    }

    /// Collects the toggled-on columns from `(toggle id, column name)` form
    /// pairs. The result follows universe order regardless of submission
    /// order.
    pub fn read_selection<I>(&self, toggled: I) -> Result<SelectedColumns, AppError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut picked = vec![false; self.columns.len()];

        for (id, name) in toggled {
            let Some(index) = id.strip_prefix(TOGGLE_PREFIX) else {
                continue;
            };
            let index: usize = index
                .parse()
                .map_err(|_| AppError::validation(format!("Unknown column toggle {}", id)))?;
            match self.columns.get_index(index) {
                Some(expected) if *expected == name => picked[index] = true,
                _ => {
                    return Err(AppError::validation(format!("Unknown column {}", name)));
                }
            }
        }

        let columns: Vec<String> = self
            .columns
            .iter()
            .zip(picked)
            .filter_map(|(name, on)| on.then(|| name.clone()))
            .collect();

        SelectedColumns::new(columns)
    }
}

pub fn toggle_id(index: usize) -> String {
    format!("{}{}", TOGGLE_PREFIX, index)
}

/// A non-empty, ordered choice of columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedColumns(Vec<String>);

impl SelectedColumns {
    pub fn new(columns: Vec<String>) -> Result<Self, AppError> {
        if columns.is_empty() {
            return Err(AppError::validation("Please select at least one column"));
        }
        Ok(Self(columns))
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn contains(&self, column: &str) -> bool {
        self.0.iter().any(|c| c == column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Shape;

    fn file(name: &str, columns: &[&str]) -> UploadedFile {
        UploadedFile {
            filename: name.to_string(),
            shape: Shape { rows: 0, cols: columns.len() },
            columns: columns.iter().map(|c| c.to_string()).collect(),
            missing_values: Default::default(),
            preview: vec![],
        }
    }

    fn universe() -> ColumnUniverse {
        ColumnUniverse::from_files(&[
            file("a.csv", &["age", "income", "city"]),
            file("b.csv", &["city", "age", "zip"]),
        ])
    }

    #[test]
    fn universe_is_the_union_without_duplicates() {
        let u = universe();
        assert_eq!(u.iter().collect::<Vec<_>>(), vec!["age", "income", "city", "zip"]);
        assert_eq!(u.iter().filter(|c| *c == "zip").count(), 1);
    }

    #[test]
    fn toggles_are_index_namespaced() {
        let u = ColumnUniverse::from_files(&[file("a.csv", &["a b", "a_b", "a-b"])]);
        let ids: Vec<_> = u.toggles().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["col-0", "col-1", "col-2"]);
    }

    #[test]
    fn selection_follows_universe_order() {
        let selected = universe()
            .read_selection(vec![
                ("col-3".to_string(), "zip".to_string()),
                ("col-0".to_string(), "age".to_string()),
            ])
            .unwrap();
        assert_eq!(selected.as_slice(), ["age", "zip"]);
    }

    #[test]
    fn empty_selection_is_invalid() {
        match universe().read_selection(Vec::new()) {
            Err(AppError::Validation(msg)) => assert_eq!(msg, "Please select at least one column"),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn mismatched_toggles_are_rejected() {
        let u = universe();
        assert!(u
            .read_selection(vec![("col-1".to_string(), "age".to_string())])
            .is_err());
        assert!(u
            .read_selection(vec![("col-99".to_string(), "age".to_string())])
            .is_err());
    }

    #[test]
    fn unrelated_fields_are_ignored() {
        let selected = universe()
            .read_selection(vec![
                ("submit".to_string(), "Analyze".to_string()),
                ("col-2".to_string(), "city".to_string()),
            ])
            .unwrap();
        assert_eq!(selected.as_slice(), ["city"]);
    }
}
