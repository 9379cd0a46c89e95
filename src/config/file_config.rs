//! Reading and writing the TOML configuration file.
//!
//! # Configuration File Format
//!
//! ```toml
//! [segmenter]
//! max_chunk_chars = 1200
//! overlap = 150
//!
//! [linker]
//! top_k = 8
//!
//! [embedding]
//! endpoint = "http://localhost:8080/v1/embeddings"
//! model = "sentence-transformers/all-MiniLM-L6-v2"
//! timeout_secs = 30
//!
//! [rerank]
//! endpoint = "http://localhost:8080/rerank"
//! model = "cross-encoder/ms-marco-MiniLM-L-2-v2"
//! api_key = "optional-bearer-token"
//! timeout_secs = 30
//!
//! [retry]
//! max_attempts = 3
//! initial_delay_ms = 500
//! max_delay_ms = 8000
//!
//! [logging]
//! level = "info"
//! ```

use std::path::Path;

use super::Config;

/// Configuration file errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Serialize error: {0}")]
    Serialize(String),
}

impl Config {
    /// Load configuration from a TOML file, without environment overrides
    pub fn load_file(path: &Path) -> Result<Self, ConfigFileError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigFileError::Io(e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigFileError::Parse(e.to_string()))
    }

    /// Render as pretty TOML
    pub fn to_toml(&self) -> Result<String, ConfigFileError> {
        toml::to_string_pretty(self).map_err(|e| ConfigFileError::Serialize(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories
    pub fn save(&self, path: &Path) -> Result<(), ConfigFileError> {
        let content = self.to_toml()?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ConfigFileError::Io(e.to_string()))?;
        }

        std::fs::write(path, content).map_err(|e| ConfigFileError::Io(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_config_file_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let toml_content = r#"
[segmenter]
max_chunk_chars = 800
overlap = 0

[linker]
top_k = 4

[embedding]
endpoint = "https://api.example.com/v1/embeddings"
model = "text-embedding-3-small"
api_key = "test-key"

[logging]
level = "debug"
"#;

        let mut file = File::create(&path).unwrap();
        file.write_all(toml_content.as_bytes()).unwrap();

        let config = Config::load_file(&path).unwrap();

        assert_eq!(config.segmenter.max_chunk_chars, 800);
        assert_eq!(config.segmenter.overlap, 0);
        assert_eq!(config.linker.top_k, 4);
        assert_eq!(config.embedding.api_key, Some("test-key".to_string()));
        assert_eq!(config.embedding.timeout_secs, 30);
        assert_eq!(config.rerank, Config::default().rerank);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_config_file_save_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.rerank.api_key = Some("saved-key".to_string());
        config.retry.max_attempts = 5;

        config.save(&path).unwrap();

        let loaded = Config::load_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_default_toml_omits_missing_keys() {
        let rendered = Config::default().to_toml().unwrap();
        assert!(rendered.contains("[segmenter]"));
        assert!(!rendered.contains("api_key"));
    }

    #[test]
    fn test_config_file_nonexistent() {
        let result = Config::load_file(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(ConfigFileError::Io(_))));
    }

    #[test]
    fn test_config_file_invalid_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("invalid.toml");

        std::fs::write(&path, "invalid = toml = content").unwrap();

        let result = Config::load_file(&path);
        assert!(matches!(result, Err(ConfigFileError::Parse(_))));
    }
}
