use anyhow::{Context, Result, anyhow};
use construction_report::instruments::identity::SiteProfile;
use tracing::info;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";

/// Settings read from the environment (after `.env` is loaded).
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub teams_webhook_url: Option<String>,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub site_profile_path: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any variable source; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        Self {
            teams_webhook_url: get("TEAMS_WEBHOOK_URL"),
            gemini_api_key: get("GEMINI_API_KEY"),
            gemini_model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            site_profile_path: get("SITE_PROFILE_PATH"),
        }
    }

    pub fn gemini_api_key(&self) -> Result<&str> {
        self.gemini_api_key
            .as_deref()
            .ok_or_else(|| anyhow!("GEMINI_API_KEY must be set"))
    }

    /// The configured site profile, or the built-in one.
    pub fn site_profile(&self) -> Result<SiteProfile> {
        match &self.site_profile_path {
            Some(path) => SiteProfile::load(path)
                .with_context(|| format!("failed to load site profile '{path}'")),
            None => Ok(SiteProfile::default()),
        }
    }

    pub fn log_summary(&self) {
        info!(
            teams_webhook = self.teams_webhook_url.is_some(),
            gemini_key = self.gemini_api_key.is_some(),
            gemini_model = %self.gemini_model,
            site_profile = self.site_profile_path.as_deref().unwrap_or("built-in"),
            "Configuration loaded"
        );
    }
}
