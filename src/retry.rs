//! 不安定な UI 操作のための回数制限付きリトライ

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::warn;

use crate::error::ScraperError;

/// 試行間の待機
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    Fixed(Duration),
    /// initial * 2^(attempt - 1)
    Exponential(Duration),
}

/// 呼び出し側で指定するリトライポリシー
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// 初回を含む試行回数
    pub max_attempts: u32,
    pub backoff: Backoff,
    /// 再試行の対象となるエラーか
    pub retryable: fn(&ScraperError) -> bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            backoff: Backoff::Fixed(Duration::from_secs(3)),
            retryable: ScraperError::is_retryable,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Backoff) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
            ..Default::default()
        }
    }

    pub fn with_predicate(mut self, retryable: fn(&ScraperError) -> bool) -> Self {
        self.retryable = retryable;
        self
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed(delay) => delay,
            Backoff::Exponential(initial) => initial * 2u32.saturating_pow(attempt - 1),
        }
    }

    /// 成功するか、再試行対象外のエラーになるか、試行回数を使い切るまで `op` を実行する
    ///
    /// 使い切った場合は最後のエラーを返す。
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T, ScraperError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ScraperError>>,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if (self.retryable)(&e) && attempt < self.max_attempts => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        "{} attempt {} failed, retrying in {:?}: {}",
                        what, attempt, delay, e
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn no_delay(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Backoff::Fixed(Duration::ZERO))
    }

    #[tokio::test]
    async fn test_retries_transient_error_then_succeeds() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result = no_delay(3)
            .run("click", move || async move {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(ScraperError::Timeout("not yet".into()))
                } else {
                    Ok(7)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<(), _> = no_delay(2)
            .run("click", move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(ScraperError::Interaction("intercepted".into()))
            })
            .await;

        assert!(matches!(result, Err(ScraperError::Interaction(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_non_retryable_error_is_returned_immediately() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<(), _> = no_delay(5)
            .run("parse", move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(ScraperError::DateParse("??".into()))
            })
            .await;

        assert!(matches!(result, Err(ScraperError::DateParse(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_custom_predicate() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let policy = no_delay(3).with_predicate(|e| matches!(e, ScraperError::Download(_)));
        let result: Result<(), _> = policy
            .run("download", move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(ScraperError::Download("503".into()))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_exponential_delay() {
        let policy = RetryPolicy::new(4, Backoff::Exponential(Duration::from_millis(100)));
        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(3), Duration::from_millis(400));
    }
}
