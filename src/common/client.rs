use crate::{parse_poll_response, UploadStatusItem, UpqueueResult};
use reqwest::IntoUrl;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;
use url::Url;

/// Client of the status endpoint
#[derive(Clone, Debug)]
pub struct StatusClient {
    client: reqwest::Client,
    endpoint: Url,
}

impl StatusClient {
    pub fn new(
        endpoint: impl IntoUrl,
        #[cfg(not(target_arch = "wasm32"))] timeout: Option<Duration>,
    ) -> UpqueueResult<Self> {
        let endpoint = endpoint.into_url()?;

        #[cfg(target_arch = "wasm32")]
        let client = reqwest::Client::new();

        #[cfg(not(target_arch = "wasm32"))]
        let client = {
            // the server keys uploads by session cookie
            let builder = reqwest::ClientBuilder::new().cookie_store(true);
            match timeout {
                Some(timeout) => builder.timeout(timeout),
                None => builder,
            }
            .build()?
        };

        Ok(Self { client, endpoint })
    }

    /// Fetch the current uploads, `None` when there is nothing to report.
    pub async fn poll(&self) -> UpqueueResult<Option<Vec<UploadStatusItem>>> {
        let body = self
            .client
            .get(self.endpoint.clone())
            .query(&[("_", cache_buster())])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        parse_poll_response(&body)
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.client
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn cache_buster() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

#[cfg(target_arch = "wasm32")]
fn cache_buster() -> u64 {
    js_sys::Date::now() as u64
}
