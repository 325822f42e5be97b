//! Fire-and-forget invocation
//!
//! The result of a detached call is dropped on purpose. Callers never see
//! its response or its failure, and an in-flight call may be abandoned if the
//! runtime shuts down first.

use crate::core::invoker::Invoke;
use crate::models::openai::ChatCompletionRequest;
use std::sync::Arc;
use tracing::debug;

/// Start `payload` on a background task without waiting for it
pub fn spawn_detached(invoker: Arc<dyn Invoke>, payload: ChatCompletionRequest) {
    // JoinHandle dropped: the task keeps running, nobody awaits it.
    tokio::spawn(async move {
        match invoker.invoke(&payload).await {
            Ok(response) => debug!(
                "[{}] Detached call finished with status {}",
                response.request_id, response.status
            ),
            Err(e) => debug!("Detached call failed, discarding: {}", e),
        }
    });
}
