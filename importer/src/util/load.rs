//! Reading the documents handed over by the other migration tools.

use err_derive::Error;
use serde::de::DeserializeOwned;
use std::path::Path;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error(display = "IO error: {}", _0)]
    Io(#[error(source)] std::io::Error),

    #[error(display = "JSON error: {}", _0)]
    Json(#[error(source)] serde_json::Error),

    #[error(display = "YAML error: {}", _0)]
    Yaml(#[error(source)] serde_yaml::Error),

    #[error(display = "TOML deserialization error: {}", _0)]
    TomlDes(#[error(source)] toml::de::Error),
}

/// The serialization formats a document may come in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
    Toml,
}

impl DocumentFormat {
    /// Guess the format from a file extension. Anything unknown is read as
    /// YAML, which also accepts plain JSON.
    pub fn from_path(path: &Path) -> DocumentFormat {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => DocumentFormat::Json,
            Some("toml") => DocumentFormat::Toml,
            _ => DocumentFormat::Yaml,
        }
    }
}

/// Parse a document already held in memory.
pub fn parse_document<T: DeserializeOwned>(
    content: &str,
    format: DocumentFormat,
) -> Result<T, LoadError> {
    Ok(match format {
        DocumentFormat::Json => serde_json::from_str(content)?,
        DocumentFormat::Yaml => serde_yaml::from_str(content)?,
        DocumentFormat::Toml => toml::from_str(content)?,
    })
}

/// Read and parse a document, picking the format by the file extension.
pub fn load_document<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, LoadError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    tracing::debug!(path = %path.display(), "loaded document");
    parse_document(&content, DocumentFormat::from_path(path))
}
