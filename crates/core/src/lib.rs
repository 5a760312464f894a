pub mod analyze;
pub mod domain;
pub mod image;
pub mod interaction;
pub mod render;
pub mod session;
pub mod storage;
pub mod submit;

pub mod config {
    use std::path::PathBuf;

    const DEFAULT_DATA_DIR: &str = ".fxdesk";

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub submit_url: Option<String>,
        pub data_dir: Option<String>,
        pub sentry_dsn: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                submit_url: std::env::var("SUBMIT_URL").ok(),
                data_dir: std::env::var("FXDESK_DATA_DIR").ok(),
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
            })
        }

        pub fn data_dir(&self) -> PathBuf {
            PathBuf::from(self.data_dir.as_deref().unwrap_or(DEFAULT_DATA_DIR))
        }
    }
}
