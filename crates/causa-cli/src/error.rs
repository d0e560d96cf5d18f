use causa_kernel::DocumentError;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to load {path}: {source}")]
    Document {
        path: String,
        #[source]
        source: DocumentError,
    },

    #[error("failed to parse config {path}: {source}")]
    Config {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Stable display form for paths carried in errors.
pub fn display_path(path: &Path) -> String {
    path.display().to_string()
}
