//! 任务生命周期监视 - 业务能力层
//!
//! 只观察，不驱动：按固定间隔轮询任务列表，直到某个任务结束或超时。

use crate::clients::JobService;
use crate::config::Config;
use crate::models::JobState;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

/// 一次等待的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalObservation {
    pub state: JobState,
    pub elapsed: Duration,
}

/// 任务生命周期监视器
pub struct LifecycleMonitor {
    service: Arc<dyn JobService>,
    poll_interval: Duration,
    max_wait: Duration,
}

impl LifecycleMonitor {
    pub fn new(service: Arc<dyn JobService>, poll_interval: Duration, max_wait: Duration) -> Self {
        Self {
            service,
            poll_interval,
            max_wait,
        }
    }

    pub fn from_config(service: Arc<dyn JobService>, config: &Config) -> Self {
        Self::new(service, config.poll_interval, config.max_wait)
    }

    /// 轮询直到任务结束
    ///
    /// 结束条件：
    /// - 观察到 `running == false`（本轮没有状态字符串时结果为 `UNKNOWN`）
    /// - 状态（忽略大小写）属于终止集合
    /// - 超过 `max_wait`，此时无论之前观察到什么都返回 `TIMEOUT`
    ///
    /// 从未出现在列表中的任务不算结束，会一直等到超时。
    /// 列表拉取失败（空表）只当作本轮没有新信息。
    pub async fn await_terminal(&self, job_name: &str) -> TerminalObservation {
        let started = Instant::now();

        loop {
            let listing = self.service.list_active().await;

            if let Some(job) = listing.get(job_name) {
                let state = job.state.as_deref().map(|raw| {
                    let parsed = JobState::parse(raw);
                    if parsed == JobState::Unknown && !raw.trim().eq_ignore_ascii_case("UNKNOWN") {
                        debug!("任务 {} 返回了无法识别的状态: {}", job_name, raw);
                    }
                    parsed
                });
                let stopped = job.running == Some(false);
                let terminal = state.map_or(false, |s| s.is_terminal());
                if stopped || terminal {
                    // 以本轮观察到的状态为准，running=false 但没有状态时记为 UNKNOWN
                    let final_state = state.unwrap_or(JobState::Unknown);
                    let elapsed = started.elapsed();
                    info!(
                        "任务 {} 结束: state={}，耗时 {:.1}s",
                        job_name,
                        final_state,
                        elapsed.as_secs_f64()
                    );
                    return TerminalObservation {
                        state: final_state,
                        elapsed,
                    };
                }
            }

            let elapsed = started.elapsed();
            if elapsed >= self.max_wait {
                warn!(
                    "等待超时: 任务 {} 超过 {}s 未结束",
                    job_name,
                    self.max_wait.as_secs_f64()
                );
                return TerminalObservation {
                    state: JobState::Timeout,
                    elapsed,
                };
            }

            sleep(self.poll_interval.min(self.max_wait - elapsed)).await;
        }
    }
}
