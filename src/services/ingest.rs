use axum::extract::Multipart;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};

use crate::error::AppError;

/// Multipart field name the backend reads uploaded files from.
pub const FILES_FIELD: &str = "files[]";
const SOURCE_FIELD: &str = "source";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileSource {
    Drop,
    #[default]
    Picker,
}

impl FileSource {
    fn parse(raw: &str) -> Self {
        match raw.trim() {
            "drop" => FileSource::Drop,
            _ => FileSource::Picker,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CandidateFile {
    pub name: String,
    pub content: Bytes,
}

impl CandidateFile {
    pub fn new(name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    fn is_csv(&self) -> bool {
        self.name.to_lowercase().ends_with(".csv")
    }
}

/// A batch in which every file passed validation.
#[derive(Debug, Clone)]
pub struct CsvBatch {
    files: Vec<CandidateFile>,
}

impl CsvBatch {
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|f| f.name.as_str())
    }

    pub fn total_bytes(&self) -> usize {
        self.files.iter().map(|f| f.content.len()).sum()
    }

    /// Packages the whole batch as repeated `files[]` parts.
    pub fn into_form(self) -> Result<Form, AppError> {
        let mut form = Form::new();
        for file in self.files {
            let part = Part::bytes(file.content.to_vec())
                .file_name(file.name)
                .mime_str("text/csv")
                .map_err(|e| AppError::transport("Error uploading files", e))?;
            form = form.part(FILES_FIELD, part);
        }
        Ok(form)
    }
}

/// All-or-nothing: one non-CSV name rejects the entire batch.
pub fn validate_batch(candidates: Vec<CandidateFile>) -> Result<CsvBatch, AppError> {
    let candidates: Vec<CandidateFile> = candidates
        .into_iter()
        .filter(|f| !f.name.trim().is_empty())
        .collect();

    if candidates.is_empty() {
        return Err(AppError::validation("No files selected"));
    }

    if let Some(rejected) = candidates.iter().find(|f| !f.is_csv()) {
        tracing::warn!("Rejecting batch of {}: {} is not a CSV file", candidates.len(), rejected.name);
        return Err(AppError::validation("Only CSV files are allowed"));
    }

    Ok(CsvBatch { files: candidates })
}

/// Reads the page's upload form into candidate files.
pub async fn read_upload_form(
    mut multipart: Multipart,
) -> Result<(FileSource, Vec<CandidateFile>), AppError> {
    let mut source = FileSource::default();
    let mut candidates = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(format!("Malformed upload: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == SOURCE_FIELD {
            let raw = field
                .text()
                .await
                .map_err(|e| AppError::validation(format!("Malformed upload: {}", e)))?;
            source = FileSource::parse(&raw);
        } else if name == FILES_FIELD {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let content = field
                .bytes()
                .await
                .map_err(|e| AppError::validation(format!("Malformed upload: {}", e)))?;
            candidates.push(CandidateFile::new(file_name, content));
        } else {
            tracing::debug!("Ignoring unexpected upload field {:?}", name);
        }
    }

    Ok((source, candidates))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn csv(name: &str) -> CandidateFile {
        CandidateFile::new(name, "a,b\n1,2\n")
    }

    #[test]
    fn accepts_csv_names_case_insensitively() {
        let batch = validate_batch(vec![csv("one.csv"), csv("TWO.CSV"), csv("three.Csv")]).unwrap();
        assert_eq!(batch.len(), 3);
        assert_eq!(batch.names().collect::<Vec<_>>(), vec!["one.csv", "TWO.CSV", "three.Csv"]);
    }

    #[test]
    fn one_bad_name_rejects_everything() {
        for bad in ["notes.txt", "data.csv.bak", "csv", "report.xlsx"] {
            let result = validate_batch(vec![csv("good.csv"), csv(bad), csv("other.csv")]);
            match result {
                Err(AppError::Validation(msg)) => assert_eq!(msg, "Only CSV files are allowed"),
                other => panic!("expected a single validation error for {}, got {:?}", bad, other),
            }
        }
    }

    #[test]
    fn empty_batch_is_rejected() {
        assert!(matches!(validate_batch(vec![]), Err(AppError::Validation(_))));
        assert!(matches!(validate_batch(vec![csv("")]), Err(AppError::Validation(_))));
    }

    #[test]
    fn blank_names_are_skipped() {
        let batch = validate_batch(vec![csv(""), csv("kept.csv")]).unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.total_bytes(), 8);
    }

    #[test]
    fn batch_packages_into_form() {
        let batch = validate_batch(vec![csv("a.csv"), csv("b.csv")]).unwrap();
        assert!(batch.into_form().is_ok());
    }

    #[test]
    fn source_defaults_to_picker() {
        assert_eq!(FileSource::parse("drop"), FileSource::Drop);
        assert_eq!(FileSource::parse("picker"), FileSource::Picker);
        assert_eq!(FileSource::parse("anything"), FileSource::Picker);
    }
}
