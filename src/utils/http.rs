// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use scraper::Html;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::HttpConfig;

/// Create a configured asynchronous HTTP client.
///
/// The proxy, when configured, is used for both `http` and `https` targets.
pub fn create_async_client(config: &HttpConfig) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs));

    if let Some(proxy_url) = config.proxy_url() {
        log::debug!("Routing requests through proxy {}", proxy_url);
        builder = builder.proxy(reqwest::Proxy::all(proxy_url.as_str())?);
    }

    Ok(builder.build()?)
}

/// Fetch a page asynchronously and parse it as HTML.
///
/// Non-success statuses are reported as errors instead of being parsed.
pub async fn fetch_page_async(client: &reqwest::Client, url: &str) -> Result<Html> {
    let target = Url::parse(url)?;
    let response = client.get(target).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(AppError::crawl(url, format!("HTTP status {}", status)));
    }
    let text = response.text().await?;
    Ok(Html::parse_document(&text))
}
