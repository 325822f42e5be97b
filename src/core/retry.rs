//! Bounded retry for network-class failures

use crate::core::invoker::{Invoke, InvokeError, RawResponse};
use crate::models::openai::ChatCompletionRequest;
use std::time::Duration;
use tracing::{error, info, warn};

/// Wait before retry number `attempt` (0-based): 2, 3, 5, 9, ... seconds
pub fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(2u64.saturating_pow(attempt).saturating_add(1))
}

/// Invoke with up to `max_retries` extra attempts
///
/// Only connection and timeout failures are retried. HTTP status errors
/// and everything else are returned on the first occurrence.
pub async fn invoke_with_retry(
    invoker: &dyn Invoke,
    payload: &ChatCompletionRequest,
    max_retries: u32,
) -> Result<RawResponse, InvokeError> {
    let mut attempt = 0;
    loop {
        match invoker.invoke(payload).await {
            Ok(response) => return Ok(response),
            Err(e) if e.is_network() && attempt < max_retries => {
                let wait = backoff_delay(attempt);
                warn!(
                    "Connection error calling {} (attempt {}/{}): {}",
                    invoker.endpoint(),
                    attempt + 1,
                    max_retries + 1,
                    e
                );
                info!("Retrying in {}s", wait.as_secs());
                tokio::time::sleep(wait).await;
                attempt += 1;
            }
            Err(e) => {
                error!("Chat completion call failed: {}", e);
                return Err(e);
            }
        }
    }
}
