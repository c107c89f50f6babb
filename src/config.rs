use serde::Deserialize;

use crate::models::Limits;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub database_url: Option<String>,
    pub web_host: String,
    pub web_port: u16,
    pub max_title_chars: usize,
    pub max_url_fragment_chars: usize,
    pub max_summary_chars: usize,
    pub log_format: LogFormat,
    pub audit_workers: usize,
}

impl Config {
    /// Reads `QUILL_*` variables, after loading a `.env` file if one exists.
    pub fn from_env() -> crate::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self::builder()?
            .add_source(config::Environment::with_prefix("QUILL"))
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    fn builder() -> crate::Result<config::ConfigBuilder<config::builder::DefaultState>> {
        let limits = Limits::default();

        Ok(config::Config::builder()
            .set_default("web_host", "0.0.0.0")?
            .set_default("web_port", 3000)?
            .set_default("max_title_chars", limits.max_title_chars as u64)?
            .set_default("max_url_fragment_chars", limits.max_url_fragment_chars as u64)?
            .set_default("max_summary_chars", limits.max_summary_chars as u64)?
            .set_default("log_format", "pretty")?
            .set_default("audit_workers", 4)?)
    }

    pub fn web_addr(&self) -> String {
        format!("{}:{}", self.web_host, self.web_port)
    }

    pub fn limits(&self) -> Limits {
        Limits {
            max_title_chars: self.max_title_chars,
            max_url_fragment_chars: self.max_url_fragment_chars,
            max_summary_chars: self.max_summary_chars,
        }
    }
}
