use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::settings::{MemorySettingsStore, SettingsStore};
use crate::translate::{
    GeminiHttpTransport, OrchestratorSettings, RetryPolicy, Sleeper, TokioSleeper,
    TranslationClient, TranslationOrchestrator, UpstreamTransport,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub settings: Arc<dyn SettingsStore>,
    pub orchestrator: Arc<TranslationOrchestrator>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let translator = &config.translator_config;
        let transport = Arc::new(GeminiHttpTransport::new(
            translator.endpoint.clone(),
            Duration::from_secs(translator.connect_timeout_secs),
            Duration::from_secs(translator.request_timeout_secs),
        )?);
        let settings = Arc::new(MemorySettingsStore::seeded(
            &config.plugin_config.plugin_id,
            &config.plugin_config.settings,
        ));

        Ok(Self::with_parts(config, settings, transport, Arc::new(TokioSleeper)))
    }

    /// Assemble state from explicit collaborators.
    pub fn with_parts(
        config: Config,
        settings: Arc<dyn SettingsStore>,
        transport: Arc<dyn UpstreamTransport>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        let translator = &config.translator_config;
        let client = TranslationClient::new(
            transport,
            sleeper.clone(),
            RetryPolicy::from(&translator.retry),
        );
        let orchestrator = Arc::new(TranslationOrchestrator::new(
            client,
            sleeper,
            OrchestratorSettings::from(translator),
        ));

        Self {
            config,
            settings,
            orchestrator,
        }
    }

    /// The upstream API key from the settings store, if one is configured.
    pub fn api_key(&self) -> Option<String> {
        let plugin = &self.config.plugin_config;
        self.settings.get(&plugin.plugin_id, &plugin.api_key_setting)
    }
}
