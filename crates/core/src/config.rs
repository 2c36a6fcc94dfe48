use std::env;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Default open-platform API base.
pub const DEFAULT_BASE_URL: &str = "https://open.feishu.cn/open-apis";

/// Application credentials for the remote workspace platform.
///
/// Built explicitly and passed into the client constructor; nothing in the
/// engine crates reads the process environment on its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiCredentials {
    pub app_id: String,
    pub app_secret: String,
    pub base_url: String,
}

impl ApiCredentials {
    pub fn new(app_id: impl Into<String>, app_secret: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            app_secret: app_secret.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Build credentials from `BASEOPS_APP_ID` / `BASEOPS_APP_SECRET`
    /// (call `load_dotenv()` first). `BASEOPS_BASE_URL` overrides the
    /// default endpoint, e.g. for a mock server in integration tests.
    ///
    /// Returns `None` when either credential is unset, so commands that
    /// never touch the network work without them.
    pub fn from_env() -> Option<Self> {
        let app_id = env_opt("BASEOPS_APP_ID")?;
        let app_secret = env_opt("BASEOPS_APP_SECRET")?;
        Some(Self {
            app_id,
            app_secret,
            base_url: env_or("BASEOPS_BASE_URL", DEFAULT_BASE_URL),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_env_requires_both_credentials() {
        env::remove_var("BASEOPS_APP_ID");
        env::remove_var("BASEOPS_APP_SECRET");
        assert!(ApiCredentials::from_env().is_none());

        env::set_var("BASEOPS_APP_ID", "cli_test");
        assert!(ApiCredentials::from_env().is_none());

        env::set_var("BASEOPS_APP_SECRET", "s3cret");
        let creds = ApiCredentials::from_env().unwrap();
        assert_eq!(creds.app_id, "cli_test");
        assert_eq!(creds.base_url, DEFAULT_BASE_URL);

        env::remove_var("BASEOPS_APP_ID");
        env::remove_var("BASEOPS_APP_SECRET");
    }
}
