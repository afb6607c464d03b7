use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Clone, Deserialize, Debug)]
pub struct AppConfig {
    #[serde(default)]
    pub pinecone_api_key: Option<String>,
    #[serde(default = "default_control_plane_url")]
    pub pinecone_control_plane_url: String,
    #[serde(default = "default_index_name")]
    pub index_name: String,
    #[serde(default = "default_index_namespace")]
    pub index_namespace: String,
    #[serde(default = "default_index_cloud")]
    pub index_cloud: String,
    #[serde(default = "default_index_region")]
    pub index_region: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default)]
    pub openai_api_key: String,
    #[serde(default = "default_base_url")]
    pub openai_base_url: String,
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

fn default_control_plane_url() -> String {
    "https://api.pinecone.io".to_string()
}

fn default_index_name() -> String {
    "exemption-policy".to_string()
}

fn default_index_namespace() -> String {
    "policy-and-exemption-criterion".to_string()
}

fn default_index_cloud() -> String {
    "aws".to_string()
}

fn default_index_region() -> String {
    "us-east-1".to_string()
}

fn default_embedding_model() -> String {
    "llama-text-embed-v2".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_chat_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_data_dir() -> String {
    "./data".to_string()
}

fn default_http_port() -> u16 {
    8000
}

fn default_allowed_origins() -> Vec<String> {
    vec![
        "http://localhost:5173".to_string(),
        "http://localhost:3000".to_string(),
    ]
}

fn default_poll_timeout_secs() -> u64 {
    60
}

fn default_poll_interval_secs() -> u64 {
    5
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            pinecone_api_key: None,
            pinecone_control_plane_url: default_control_plane_url(),
            index_name: default_index_name(),
            index_namespace: default_index_namespace(),
            index_cloud: default_index_cloud(),
            index_region: default_index_region(),
            embedding_model: default_embedding_model(),
            openai_api_key: String::new(),
            openai_base_url: default_base_url(),
            chat_model: default_chat_model(),
            data_dir: default_data_dir(),
            http_port: default_http_port(),
            allowed_origins: default_allowed_origins(),
            poll_timeout_secs: default_poll_timeout_secs(),
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

pub fn get_config() -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::with_name("config").required(false))
        .add_source(Environment::default())
        .build()?;

    config.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_upstream_index_conventions() {
        let config = AppConfig::default();

        assert!(config.pinecone_api_key.is_none());
        assert_eq!(config.index_name, "exemption-policy");
        assert_eq!(config.index_namespace, "policy-and-exemption-criterion");
        assert_eq!(config.index_cloud, "aws");
        assert_eq!(config.index_region, "us-east-1");
        assert_eq!(config.poll_timeout_secs, 60);
        assert_eq!(config.poll_interval_secs, 5);
    }
}
