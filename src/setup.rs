use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment};
use serde::Deserialize;

pub const SESSION_KEY_LEN: usize = 32;

fn default_max_upload_bytes() -> u64 {
    10 * 1024 * 1024
}

/// Endpoints and credentials of the hosted platform.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BackendConfig {
    pub auth_url: String,
    pub data_url: String,
    pub storage_url: String,
    pub api_key: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Setup {
    pub log_level: String,
    pub port: u16,
    pub session_key: String,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
    pub backend: BackendConfig,
}

impl Setup {
    /// Reads `name` (e.g. `setup` for `setup.toml`), then `NOTE_BOARD__*` variables on top.
    pub fn load(name: &str) -> Result<Self, handle_errors::Error> {
        let builder = Config::builder()
            .add_source(config::File::with_name(name))
            .add_source(
                Environment::with_prefix("NOTE_BOARD")
                    .separator("__")
                    .try_parsing(true),
            );
        Self::build(builder)
    }

    pub fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self, handle_errors::Error> {
        let setup = builder.build()?.try_deserialize::<Setup>()?;
        setup.normalized()
    }

    fn normalized(mut self) -> Result<Self, handle_errors::Error> {
        if self.session_key.len() != SESSION_KEY_LEN {
            return Err(handle_errors::Error::InvalidSetup(format!(
                "session_key must be {} bytes, got {}",
                SESSION_KEY_LEN,
                self.session_key.len()
            )));
        }
        if self.max_upload_bytes == 0 {
            return Err(handle_errors::Error::InvalidSetup(
                "max_upload_bytes must be positive".to_string(),
            ));
        }

        let backend = &mut self.backend;
        for (field, url) in [
            ("auth_url", &mut backend.auth_url),
            ("data_url", &mut backend.data_url),
            ("storage_url", &mut backend.storage_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(handle_errors::Error::InvalidSetup(format!(
                    "backend.{} is not an http(s) url: {:?}",
                    field, url
                )));
            }
            let trimmed = url.trim_end_matches('/').len();
            url.truncate(trimmed);
        }
        Ok(self)
    }

    /// Used when `RUST_LOG` is not set.
    pub fn log_filter(&self) -> String {
        format!(
            "handle_errors={},note_board={},warp={}",
            self.log_level, self.log_level, self.log_level
        )
    }
}
