use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::series::Series;
use crate::state::Config;

pub mod parse;
pub mod retry;

use retry::HttpStatusError;

/// Anything that can hand the poller a fresh series and a headline value.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Bulk series, in feed space (0 at the bottom).
    async fn fetch_series(&self) -> Result<Series>;
    /// Coarse "high" for the headline dot.
    async fn fetch_high(&self) -> Result<f64>;
}

pub struct GcpFeed {
    client: Client,
    graph_url: String,
    index_url: String,
    pixels: u32,
    seconds: i64,
}

impl GcpFeed {
    pub fn new(cfg: &Config) -> Result<Self> {
        // validate early so a typo fails at startup, not on every poll
        Url::parse(&cfg.graph_url).with_context(|| format!("bad GCP_GRAPH_URL {}", cfg.graph_url))?;
        Url::parse(&cfg.index_url).with_context(|| format!("bad GCP_INDEX_URL {}", cfg.index_url))?;
        Ok(Self {
            client: Client::new(),
            graph_url: cfg.graph_url.clone(),
            index_url: cfg.index_url.clone(),
            pixels: cfg.graph_pixels,
            seconds: cfg.graph_seconds,
        })
    }

    /// Graph URL with `pixels`, `seconds` and a cache-busting millisecond nonce.
    pub fn graph_request_url(&self, nonce_ms: u64) -> Result<Url> {
        let url = Url::parse_with_params(
            &self.graph_url,
            &[
                ("pixels", self.pixels.to_string()),
                ("seconds", self.seconds.to_string()),
                ("nonce", nonce_ms.to_string()),
            ],
        )?;
        Ok(url)
    }

    async fn get_text(&self, url: Url) -> Result<String> {
        let resp = self.client.get(url.clone()).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow::Error::new(HttpStatusError {
                status: status.as_u16(),
            }))
            .with_context(|| format!("GET {}", url));
        }
        Ok(resp.text().await?)
    }
}

#[async_trait]
impl DataSource for GcpFeed {
    async fn fetch_series(&self) -> Result<Series> {
        let nonce = chrono::Utc::now().timestamp_millis().max(0) as u64;
        let url = self.graph_request_url(nonce)?;
        let body = self.get_text(url).await?;
        Ok(parse::parse_series(&body))
    }

    async fn fetch_high(&self) -> Result<f64> {
        let url = Url::parse(&self.index_url)?;
        let body = self.get_text(url).await?;
        Ok(parse::coarse_high(&body))
    }
}
