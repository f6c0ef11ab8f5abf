//! Data-driven case files
//!
//! Each record in a case file drives one generated test invocation. Files
//! live under the configured data directory as JSON, or YAML when the
//! extension says so.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{E2eError, E2eResult};

/// A record type backed by a named case file
pub trait DataCase: DeserializeOwned + Send + Sync + 'static {
    /// File name without extension
    const FILE_STEM: &'static str;

    /// Test name suffix for this record
    fn label(&self) -> String;
}

/// Negative UI login attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginCase {
    pub case: String,
    pub email: String,
    pub password: String,
    /// `None` means the form must refuse to submit, leaving the URL unchanged
    #[serde(default)]
    pub expected_message: Option<String>,
}

impl DataCase for LoginCase {
    const FILE_STEM: &'static str = "login-invalid-data";

    fn label(&self) -> String {
        self.case.clone()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiLoginCase {
    pub test_case: String,
    pub email: String,
    pub password: String,
    pub expected_response_code: i64,
}

impl DataCase for ApiLoginCase {
    const FILE_STEM: &'static str = "api-login-cases";

    fn label(&self) -> String {
        format!("API-DD-{}", self.test_case)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartCase {
    pub test_case: String,
    pub product_index: usize,
    pub expected_quantity: String,
}

impl DataCase for CartCase {
    const FILE_STEM: &'static str = "cart-products";

    fn label(&self) -> String {
        format!("TC-DD-{}", self.test_case)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutCommentCase {
    pub test_case: String,
    pub comment: String,
}

impl DataCase for CheckoutCommentCase {
    const FILE_STEM: &'static str = "checkout-comments";

    fn label(&self) -> String {
        format!("TC-DD-{}", self.test_case)
    }
}

/// Load every record of `T`'s case file under `dir`
pub fn load_cases<T: DataCase>(dir: &Path) -> E2eResult<Vec<T>> {
    let path = locate(dir, T::FILE_STEM)?;
    load_case_file(&path)
}

/// Parse one case file, choosing the format by extension
pub fn load_case_file<T: DeserializeOwned>(path: &Path) -> E2eResult<Vec<T>> {
    let content = std::fs::read_to_string(path).map_err(|e| case_error(path, e))?;
    let cases: Vec<T> = match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => serde_yaml::from_str(&content).map_err(|e| case_error(path, e))?,
        _ => serde_json::from_str(&content).map_err(|e| case_error(path, e))?,
    };
    debug!("Loaded {} case(s) from {}", cases.len(), path.display());
    Ok(cases)
}

/// All case files under `dir`, sorted by path
pub fn case_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.path()
                .extension()
                .map(|ext| ext == "json" || ext == "yaml" || ext == "yml")
                .unwrap_or(false)
        })
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}

/// Case files under `dir` whose stem is not in `stems`; nothing reads them
pub fn unclaimed_case_files(dir: &Path, stems: &[&str]) -> Vec<PathBuf> {
    case_files(dir)
        .into_iter()
        .filter(|path| {
            path.file_stem()
                .and_then(|stem| stem.to_str())
                .map_or(true, |stem| !stems.contains(&stem))
        })
        .collect()
}

fn locate(dir: &Path, stem: &str) -> E2eResult<PathBuf> {
    ["json", "yaml", "yml"]
        .iter()
        .map(|ext| dir.join(format!("{}.{}", stem, ext)))
        .find(|candidate| candidate.is_file())
        .ok_or_else(|| E2eError::CaseFile {
            path: dir.join(format!("{}.json", stem)).display().to_string(),
            reason: "not found".to_string(),
        })
}

fn case_error(path: &Path, error: impl std::fmt::Display) -> E2eError {
    E2eError::CaseFile {
        path: path.display().to_string(),
        reason: error.to_string(),
    }
}
