//! 重试策略 - 业务能力层
//!
//! 对任意可失败的异步操作做有限次重试，退避时间随尝试次数线性增长。

use crate::config::Config;
use crate::models::SubmitResponse;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

/// 操作结果是否值得再试一次
pub trait Retryable {
    fn should_retry(&self) -> bool;
}

impl Retryable for SubmitResponse {
    fn should_retry(&self) -> bool {
        !self.accepted
    }
}

/// 线性退避重试策略
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// 最大尝试次数（含首次）
    pub max_attempts: u32,
    /// 第 n 次失败后等待 `n * base_delay`
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.max_start_attempts, config.retry_base_delay)
    }

    /// 第 `attempt` 次（从1开始）失败后的等待时间
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }

    /// 执行操作，必要时重试
    ///
    /// `operation` 接收当前尝试序号（从1开始）。成功立即返回；
    /// 全部失败时原样返回最后一次结果。最后一次失败后不再等待。
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> T
    where
        T: Retryable,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = T>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            let outcome = operation(attempt).await;
            if !outcome.should_retry() || attempt >= max_attempts {
                return outcome;
            }

            let delay = self.backoff(attempt);
            debug!("第 {}/{} 次尝试失败，{:?} 后重试", attempt, max_attempts, delay);
            sleep(delay).await;
            attempt += 1;
        }
    }
}
