use std::path::PathBuf;

use anyhow::{Context, Result};

/// Which embedding backend the pipeline talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmbeddingProviderKind {
    /// Remote OpenAI-compatible embeddings endpoint.
    OpenAi,
    /// No network calls; every text gets a deterministic pseudo vector.
    Local,
}

/// Application configuration loaded from environment variables.
///
/// Everything optional has a working default so an offline run (no Kaggle
/// credentials, no embedding key) still completes end to end.
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub embedding_provider: EmbeddingProviderKind,
    pub openai_api_key: Option<String>,
    pub kaggle_username: Option<String>,
    pub kaggle_key: Option<String>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let provider = match optional_env("EMBEDDING_PROVIDER").as_deref() {
            Some("local") => EmbeddingProviderKind::Local,
            _ => EmbeddingProviderKind::OpenAi,
        };

        Ok(Config {
            data_dir: PathBuf::from(
                optional_env("DATA_DIR").unwrap_or_else(|| "./data".to_string()),
            ),
            embedding_provider: provider,
            openai_api_key: optional_env("OPENAI_API_KEY"),
            kaggle_username: optional_env("KAGGLE_USERNAME"),
            kaggle_key: optional_env("KAGGLE_KEY"),
            port: optional_env("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: optional_env("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }

    pub fn raw_dir(&self) -> PathBuf {
        self.data_dir.join("raw")
    }

    pub fn clean_dir(&self) -> PathBuf {
        self.data_dir.join("clean")
    }

    pub fn vector_dir(&self) -> PathBuf {
        self.data_dir.join("vectorstore")
    }

    pub fn reports_dir(&self) -> PathBuf {
        self.data_dir.join("reports")
    }

    pub fn samples_dir(&self) -> PathBuf {
        self.data_dir.join("samples")
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("db.sqlite")
    }

    /// Creates every directory the pipeline writes into.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        for dir in [
            self.raw_dir(),
            self.clean_dir(),
            self.vector_dir(),
            self.reports_dir(),
            self.samples_dir(),
        ] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}
