use anyhow::Context;
use async_trait::async_trait;

use super::CredentialClient;

/// Calls this service's own `delete-credential` endpoint on behalf of a viewer.
pub struct HttpCredentialClient {
    base_url: String,
    api_token: String,
    viewer_id: i64,
    client: reqwest::Client,
}

impl HttpCredentialClient {
    pub fn new(base_url: String, api_token: String, viewer_id: i64) -> Self {
        Self {
            base_url,
            api_token,
            viewer_id,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl CredentialClient for HttpCredentialClient {
    async fn delete_credential(&self, id: i64) -> anyhow::Result<()> {
        let url = format!(
            "{}/api/viewer/delete-credential",
            self.base_url.trim_end_matches('/')
        );

        self.client
            .post(&url)
            .bearer_auth(&self.api_token)
            .header("x-user-id", self.viewer_id.to_string())
            .json(&serde_json::json!({ "id": id }))
            .send()
            .await
            .context("failed to send delete-credential request")?
            .error_for_status()
            .context("delete-credential returned error")?;

        Ok(())
    }
}
