use anyhow::{anyhow, Context};
use async_trait::async_trait;
use reqwest::{Client, Url};
use std::sync::Arc;
use std::time::Duration;
#[allow(unused)]
use tracing::{debug, info};
use wideload::prelude::*;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_TARGET: &str = "http://127.0.0.1:3000/";

/// `GET`s the target URL. Any transport error or non-success status is a failed invocation.
pub struct HttpWorkload {
    client: Client,
    url: Url,
}

impl HttpWorkload {
    pub fn new(url: &str) -> anyhow::Result<Self> {
        let url = Url::parse(url).with_context(|| format!("invalid target URL {url:?}"))?;
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { client, url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

pub fn suite(config: &RunConfig) -> Result<Suite, BoxError> {
    let url = config.target.as_deref().unwrap_or(DEFAULT_TARGET);
    let workload = HttpWorkload::new(url)?;
    Ok(Suite::new("http").with(Arc::new(workload)))
}

#[async_trait]
impl Workload for HttpWorkload {
    fn name(&self) -> &str {
        "http"
    }

    async fn setup_once(&self, worker: WorkerId) -> Result<(), BoxError> {
        debug!("{worker} targeting {}", self.url);
        Ok(())
    }

    async fn test(&self, _worker: WorkerId) -> Result<(), BoxError> {
        let res = self.client.get(self.url.clone()).send().await?;
        let status = res.status();
        if !status.is_success() {
            return Err(anyhow!("{} responded with {status}", self.url).into());
        }
        Ok(())
    }
}
