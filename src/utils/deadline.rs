use crate::error::{AppError, AppResult};
use std::future::Future;
use std::time::Duration;

/// Runs `fut` until it completes or `limit` elapses. An elapsed deadline drops
/// the pending store operation and yields [`AppError::Timeout`].
pub async fn with_deadline<T, F>(limit: Duration, fut: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(AppError::Timeout),
    }
}
