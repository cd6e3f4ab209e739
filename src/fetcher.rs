// SPDX-FileCopyrightText: 2025 Robin Vobruba <hoijui.quaero@gmail.com>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use reqwest::{header, Client, StatusCode};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{
    default_on_request_failure, policies::ExponentialBackoff, Jitter, RetryTransientMiddleware,
    Retryable, RetryableStrategy,
};
use thiserror::Error;
use url::Url;

use crate::settings::Settings;

pub type RL = governor::RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::QuantaClock,
    governor::middleware::NoOpMiddleware<governor::clock::QuantaInstant>,
>;

/// Growth factor of the delay between two consecutive retries.
pub const BACKOFF_BASE: u32 = 3;

/// HTTP status codes on which we retry;
/// 500 (Internal Server Error) up to 511 (Network Authentication Required).
const RETRY_STATUS_CODES: std::ops::RangeInclusive<u16> = 500..=511;

/// Thrown when a document could not be fetched,
/// after all retries were exhausted.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Fetching '{url}' failed with HTTP status {status}: {message}")]
    Status {
        url: Url,
        status: StatusCode,
        message: String,
    },
    #[error("Network/Internet download of '{url}' failed: {source}")]
    Transport {
        url: Url,
        #[source]
        source: reqwest::Error,
    },
    #[error("Network/Internet download of '{url}' failed: {source}")]
    Middleware {
        url: Url,
        #[source]
        source: reqwest_middleware::Error,
    },
    #[error("Failed to read the body of '{url}': {source}")]
    Body {
        url: Url,
        #[source]
        source: reqwest::Error,
    },
}

impl FetchError {
    #[must_use]
    pub const fn url(&self) -> &Url {
        match self {
            Self::Status { url, .. }
            | Self::Transport { url, .. }
            | Self::Middleware { url, .. }
            | Self::Body { url, .. } => url,
        }
    }
}

/// Something that can download a text document.
///
/// The pipeline only ever talks to this trait,
/// which allows to feed it with canned documents.
#[async_trait(?Send)]
pub trait Fetch {
    /// Fetches the document at `url` as text.
    async fn fetch_text(&self, url: &Url) -> Result<String, FetchError>;
}

/// Retries on network failures and on server errors (500 - 511),
/// but on nothing else;
/// e.g. "429 Too Many Requests" is handled by pacing instead.
struct ServerErrorRetryStrategy;

impl RetryableStrategy for ServerErrorRetryStrategy {
    fn handle(
        &self,
        res: &Result<reqwest::Response, reqwest_middleware::Error>,
    ) -> Option<Retryable> {
        match res {
            Ok(response) => {
                if RETRY_STATUS_CODES.contains(&response.status().as_u16()) {
                    Some(Retryable::Transient)
                } else {
                    None
                }
            }
            Err(err) => default_on_request_failure(err),
        }
    }
}

/// Creates a default set of headers for downloads.
fn create_headers(user_agent: &str) -> header::HeaderMap {
    let mut headers = header::HeaderMap::new();
    let user_agent_value = header::HeaderValue::from_str(user_agent).unwrap_or_else(|_| {
        tracing::warn!("Invalid user-agent '{user_agent}' configured; using the default");
        crate::tools::USER_AGENT_VALUE.clone()
    });
    headers.insert(header::USER_AGENT, user_agent_value);
    headers
}

/// Creates a new [`reqwest::Client`] with retry and (optional) timeout.
///
/// The delay before retry `n` (starting at 0) is `base_delay * 3^n`.
fn create_downloader(
    retries: u32,
    base_delay: Duration,
    timeout: Option<Duration>,
    headers: header::HeaderMap,
) -> Result<ClientWithMiddleware, reqwest::Error> {
    let max_delay = base_delay.saturating_mul(BACKOFF_BASE.saturating_pow(retries));
    let retry_policy = ExponentialBackoff::builder()
        .retry_bounds(base_delay, max_delay)
        .jitter(Jitter::None)
        .base(BACKOFF_BASE)
        .build_with_max_retries(retries);
    let mut client_builder = Client::builder().default_headers(headers);
    if let Some(timeout_val) = timeout {
        client_builder = client_builder.timeout(timeout_val);
    }
    Ok(ClientBuilder::new(client_builder.build()?)
        .with(RetryTransientMiddleware::new_with_policy_and_strategy(
            retry_policy,
            ServerErrorRetryStrategy,
        ))
        .build())
}

/// Downloads documents over HTTP(S),
/// retrying with exponential backoff on transient failures.
pub struct HttpFetcher {
    client: ClientWithMiddleware,
    rate_limiter: Option<Arc<RL>>,
}

impl HttpFetcher {
    pub fn new(settings: &Settings) -> Result<Self, reqwest::Error> {
        let client = create_downloader(
            settings.retries,
            Duration::from_millis(settings.retry_base_delay_ms),
            settings.timeout_ms.map(Duration::from_millis),
            create_headers(&settings.user_agent),
        )?;
        let rate_limiter = settings
            .min_request_interval_ms
            .filter(|interval| *interval > 0)
            .and_then(|interval| Quota::with_period(Duration::from_millis(interval)))
            .map(|quota| Arc::new(RateLimiter::direct(quota)));
        Ok(Self {
            client,
            rate_limiter,
        })
    }
}

#[async_trait(?Send)]
impl Fetch for HttpFetcher {
    async fn fetch_text(&self, url: &Url) -> Result<String, FetchError> {
        if let Some(rate_limiter) = &self.rate_limiter {
            rate_limiter.until_ready().await;
        }
        tracing::debug!("Fetching '{url}' ...");
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| match source {
                reqwest_middleware::Error::Reqwest(source) => FetchError::Transport {
                    url: url.clone(),
                    source,
                },
                reqwest_middleware::Error::Middleware(_) => FetchError::Middleware {
                    url: url.clone(),
                    source,
                },
            })?;

        let status = response.status();
        if !(status.is_success() || status.is_redirection()) {
            return Err(FetchError::Status {
                url: url.clone(),
                status,
                message: status
                    .canonical_reason()
                    .unwrap_or("Unknown status")
                    .to_owned(),
            });
        }

        let text = response.text().await.map_err(|source| FetchError::Body {
            url: url.clone(),
            source,
        })?;
        tracing::debug!("Fetched '{url}' ({} bytes).", text.len());
        Ok(text)
    }
}
