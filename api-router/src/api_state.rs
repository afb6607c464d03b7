use std::sync::Arc;

use common::utils::config::AppConfig;

#[derive(Clone)]
pub struct ApiState {
    pub openai_client: Arc<async_openai::Client<async_openai::config::OpenAIConfig>>,
    pub config: AppConfig,
}

impl ApiState {
    pub fn new(config: &AppConfig) -> Self {
        let openai_client = Arc::new(async_openai::Client::with_config(
            async_openai::config::OpenAIConfig::new()
                .with_api_key(&config.openai_api_key)
                .with_api_base(&config.openai_base_url),
        ));

        Self {
            openai_client,
            config: config.clone(),
        }
    }
}
