//! Construction of remote collaborators from CLI context.

use std::sync::Arc;

use anyhow::{Context, Result};

use baseops_client::{ApiClient, Bitable, Docs};
use baseops_core::ApiCredentials;

/// Authenticated API client from environment credentials.
pub fn api_client() -> Result<Arc<ApiClient>> {
    let creds = ApiCredentials::from_env()
        .context("BASEOPS_APP_ID and BASEOPS_APP_SECRET must be set for remote commands")?;
    Ok(Arc::new(ApiClient::new(creds)))
}

/// Records client for the base given by `--app` / `BASEOPS_APP_TOKEN`.
pub fn bitable(app: Option<&str>) -> Result<Bitable> {
    let app = app.context("--app (or BASEOPS_APP_TOKEN) is required for this command")?;
    Ok(Bitable::new(api_client()?, app))
}

/// Documents client, optionally targeting a folder.
pub fn docs(folder: Option<String>) -> Result<Docs> {
    Ok(Docs::new(api_client()?, folder))
}
