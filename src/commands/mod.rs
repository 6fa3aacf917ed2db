use anyhow::Result;
use repcycle::config::Config;
use repcycle::gemini::GeminiClient;
use repcycle::models::Progress;
use repcycle::store::ProgressStore;

pub mod config;
pub mod export;
pub mod nutrition;
pub mod profile;
pub mod status;
pub mod train;
pub mod workout;

/// A user without saved progress starts from an empty plan.
pub async fn load_progress(store: &dyn ProgressStore, user_id: &str) -> Result<Progress> {
    Ok(store.load_progress(user_id).await?.unwrap_or_default())
}

/// `None` when no API key is configured.
pub fn gemini(cfg: &Config) -> Option<GeminiClient> {
    cfg.gemini_api_key()
        .map(|key| GeminiClient::new(key).with_model(cfg.gemini_model()))
}
