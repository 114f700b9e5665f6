pub mod analysis;
pub mod domain;
pub mod ingest;
pub mod nlp;
pub mod storage;

pub mod config {
    use anyhow::Context;
    use std::path::PathBuf;

    const DEFAULT_DATA_DIR: &str = ".";

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub hf_api_token: Option<String>,
        pub hf_inference_base_url: Option<String>,
        pub transcript_provider_base_url: Option<String>,
        pub transcript_provider_api_key: Option<String>,
        pub data_dir: PathBuf,
        pub portfolio_path: Option<PathBuf>,
        pub sentry_dsn: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                hf_api_token: non_empty_var("HF_API_TOKEN"),
                hf_inference_base_url: non_empty_var("HF_INFERENCE_BASE_URL"),
                transcript_provider_base_url: non_empty_var("TRANSCRIPT_PROVIDER_BASE_URL"),
                transcript_provider_api_key: non_empty_var("TRANSCRIPT_PROVIDER_API_KEY"),
                data_dir: non_empty_var("PORTWATCH_DATA_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
                portfolio_path: non_empty_var("PORTFOLIO_PATH").map(PathBuf::from),
                sentry_dsn: non_empty_var("SENTRY_DSN"),
            })
        }

        pub fn require_hf_api_token(&self) -> anyhow::Result<&str> {
            self.hf_api_token
                .as_deref()
                .context("HF_API_TOKEN is required")
        }

        pub fn require_transcript_provider_base_url(&self) -> anyhow::Result<&str> {
            self.transcript_provider_base_url
                .as_deref()
                .context("TRANSCRIPT_PROVIDER_BASE_URL is required")
        }
    }

    fn non_empty_var(key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|s| !s.trim().is_empty())
    }
}
