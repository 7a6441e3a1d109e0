use std::{sync::Arc, time::Duration};

use futures::future::BoxFuture;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tokio::time::sleep;
use tracing::debug;

use crate::{
    config::TriviaConfig,
    state::game::Question,
    trivia::{models::TriviaApiResponse, normalize::normalize},
};

/// Errors surfaced by the question supplier.
#[derive(Debug, Error)]
pub enum SupplierError {
    /// The HTTP client could not be built.
    #[error("failed to build trivia HTTP client")]
    ClientBuilder {
        /// Builder failure.
        #[source]
        source: reqwest::Error,
    },
    /// The trivia source could not be reached.
    #[error("trivia request failed")]
    Network {
        /// Transport failure.
        #[source]
        source: reqwest::Error,
    },
    /// The trivia source answered with a non-success HTTP status.
    #[error("trivia source returned status {status}")]
    Upstream {
        /// HTTP status of the response.
        status: StatusCode,
    },
    /// The trivia source reported a non-zero semantic response code.
    #[error("trivia source reported response code {code}")]
    ResponseCode {
        /// Source-level status code.
        code: u8,
    },
    /// The trivia source kept rate limiting after every allowed retry.
    #[error("trivia source still rate limiting after {attempts} retries")]
    RateLimited {
        /// Number of retries that were attempted.
        attempts: u32,
    },
    /// The response body could not be decoded.
    #[error("failed to decode trivia payload")]
    Decode {
        /// Deserialization failure.
        #[source]
        source: reqwest::Error,
    },
}

/// Outcome of a single fetch attempt: either a usable value or a rate-limit
/// signal that the retry loop may absorb.
pub(crate) enum Attempt<T> {
    /// The attempt produced a value.
    Ready(T),
    /// The source asked us to back off (HTTP 429).
    RateLimited,
}

/// Supplier of normalized question batches.
pub trait QuestionSupplier: Send + Sync {
    /// Fetch `count` questions, retrying rate limits before failing.
    fn fetch(&self, count: usize) -> BoxFuture<'static, Result<Vec<Question>, SupplierError>>;
}

/// HTTP client for an Open-Trivia-style question source.
#[derive(Clone)]
pub struct OpenTriviaClient {
    http: Client,
    api_url: Arc<str>,
    max_retries: u32,
    retry_delay: Duration,
}

impl OpenTriviaClient {
    /// Build a client from the trivia section of the app configuration.
    pub fn new(config: &TriviaConfig) -> Result<Self, SupplierError> {
        let http = Client::builder()
            .build()
            .map_err(|source| SupplierError::ClientBuilder { source })?;

        Ok(Self {
            http,
            api_url: Arc::from(config.api_url.as_str()),
            max_retries: config.max_retries,
            retry_delay: config.retry_delay,
        })
    }

    async fn fetch_once(&self, count: usize) -> Result<Attempt<Vec<Question>>, SupplierError> {
        let response = self
            .http
            .get(self.api_url.as_ref())
            .query(&[("amount", count.to_string()), ("type", "multiple".into())])
            .send()
            .await
            .map_err(|source| SupplierError::Network { source })?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            return Ok(Attempt::RateLimited);
        }
        if !response.status().is_success() {
            return Err(SupplierError::Upstream {
                status: response.status(),
            });
        }

        let payload: TriviaApiResponse = response
            .json()
            .await
            .map_err(|source| SupplierError::Decode { source })?;

        if payload.response_code != 0 {
            return Err(SupplierError::ResponseCode {
                code: payload.response_code,
            });
        }

        Ok(Attempt::Ready(normalize(payload.results)))
    }
}

impl QuestionSupplier for OpenTriviaClient {
    fn fetch(&self, count: usize) -> BoxFuture<'static, Result<Vec<Question>, SupplierError>> {
        let client = self.clone();
        Box::pin(async move {
            retry_on_rate_limit(client.max_retries, client.retry_delay, || {
                let client = client.clone();
                async move { client.fetch_once(count).await }
            })
            .await
        })
    }
}

/// Drive `attempt` until it yields a value, sleeping `delay` between
/// rate-limited attempts and giving up after `max_retries` retries.
pub(crate) async fn retry_on_rate_limit<T, F, Fut>(
    max_retries: u32,
    delay: Duration,
    mut attempt: F,
) -> Result<T, SupplierError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Attempt<T>, SupplierError>>,
{
    let mut remaining = max_retries;
    loop {
        match attempt().await? {
            Attempt::Ready(value) => return Ok(value),
            Attempt::RateLimited if remaining > 0 => {
                remaining -= 1;
                debug!(remaining, "trivia source rate limited; backing off");
                sleep(delay).await;
            }
            Attempt::RateLimited => {
                return Err(SupplierError::RateLimited {
                    attempts: max_retries,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    async fn run_retry(
        max_retries: u32,
        rate_limited_attempts: u32,
    ) -> (Result<u32, SupplierError>, u32, Duration) {
        let calls = Arc::new(AtomicU32::new(0));
        let started = tokio::time::Instant::now();

        let result = retry_on_rate_limit(max_retries, Duration::from_secs(2), || {
            let calls = calls.clone();
            async move {
                let call = calls.fetch_add(1, Ordering::SeqCst);
                if call < rate_limited_attempts {
                    Ok(Attempt::RateLimited)
                } else {
                    Ok(Attempt::Ready(call))
                }
            }
        })
        .await;

        (result, calls.load(Ordering::SeqCst), started.elapsed())
    }

    #[tokio::test(start_paused = true)]
    async fn two_rate_limits_then_success_costs_two_delays() {
        let (result, calls, elapsed) = run_retry(3, 2).await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls, 3);
        assert_eq!(elapsed, Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn immediate_success_does_not_sleep() {
        let (result, calls, elapsed) = run_retry(3, 0).await;

        assert_eq!(result.unwrap(), 0);
        assert_eq!(calls, 1);
        assert_eq!(elapsed, Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_propagate_failure() {
        let (result, calls, _) = run_retry(3, u32::MAX).await;

        assert!(matches!(
            result.unwrap_err(),
            SupplierError::RateLimited { attempts: 3 }
        ));
        // One initial attempt plus three retries.
        assert_eq!(calls, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn hard_failures_are_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_seen = calls.clone();

        let result: Result<u32, _> = retry_on_rate_limit(3, Duration::from_secs(2), move || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(SupplierError::ResponseCode { code: 2 })
            }
        })
        .await;

        assert!(matches!(
            result.unwrap_err(),
            SupplierError::ResponseCode { code: 2 }
        ));
        assert_eq!(calls_seen.load(Ordering::SeqCst), 1);
    }
}
