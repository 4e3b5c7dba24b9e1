// src/api/http.rs

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use tracing::{debug, warn};
use url::Url;

use crate::api::client::{ApiFuture, LiveApi};
use crate::api::model::{ErrorBody, Snapshot};
use crate::errors::{Result, SyncError};
use crate::types::{ControlAction, ExecutionId};

/// `LiveApi` over the dashboard's REST endpoints.
///
/// `base` is the API root (e.g. `http://127.0.0.1:8000/api/`) and must end
/// with a slash so that relative joins stay underneath it.
#[derive(Debug, Clone)]
pub struct HttpLiveApi {
    client: Client,
    base: Url,
}

impl HttpLiveApi {
    pub fn new(base: Url, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, execution_id: &ExecutionId, leaf: &str) -> Result<Url> {
        let path = format!("executions/{}/{}", execution_id.as_str(), leaf);
        Ok(self.base.join(&path)?)
    }

    async fn get_snapshot(&self, execution_id: &ExecutionId) -> Result<Snapshot> {
        let url = self.endpoint(execution_id, "live")?;
        debug!(execution = %execution_id, %url, "fetching snapshot");

        let response = self.client.get(url).send().await?;
        let response = check_status(response, execution_id).await?;
        Ok(response.json::<Snapshot>().await?)
    }

    async fn post_control(&self, execution_id: &ExecutionId, action: ControlAction) -> Result<()> {
        let url = self.endpoint(execution_id, action.as_str())?;
        debug!(execution = %execution_id, %action, %url, "sending control command");

        let response = self.client.post(url).send().await?;
        check_status(response, execution_id).await?;
        Ok(())
    }
}

impl LiveApi for HttpLiveApi {
    fn fetch_snapshot<'a>(&'a self, execution_id: &'a ExecutionId) -> ApiFuture<'a, Snapshot> {
        Box::pin(self.get_snapshot(execution_id))
    }

    fn send_control<'a>(
        &'a self,
        execution_id: &'a ExecutionId,
        action: ControlAction,
    ) -> ApiFuture<'a, ()> {
        Box::pin(self.post_control(execution_id, action))
    }
}

/// Map non-2xx responses onto `NotFound` / `Rejected`.
async fn check_status(response: Response, execution_id: &ExecutionId) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::NOT_FOUND {
        return Err(SyncError::NotFound(execution_id.clone()));
    }

    let body = response.text().await.unwrap_or_default();
    let detail = match serde_json::from_str::<ErrorBody>(&body) {
        Ok(parsed) => parsed.detail,
        Err(_) if !body.trim().is_empty() => body.trim().to_string(),
        Err(_) => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
    };

    warn!(execution = %execution_id, status = status.as_u16(), %detail, "backend rejected request");
    Err(SyncError::Rejected {
        status: status.as_u16(),
        detail,
    })
}
