//! 测试用的内存任务服务

use crate::clients::JobService;
use crate::models::{ActiveJob, SubmitResponse};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// 触发 worker 内部 panic 的链接
pub(crate) const PANIC_ITEM: &str = "panic://worker";

#[derive(Default)]
struct FakeState {
    /// (任务名, 提交时间)，包括失败的尝试
    submits: Vec<(String, Instant)>,
    attempts: HashMap<String, usize>,
    accepted_at: HashMap<String, Instant>,
    finished: HashMap<String, bool>,
    in_flight: usize,
    max_in_flight: usize,
}

/// 可配置行为的内存任务服务
pub(crate) struct FakeJobService {
    state: Mutex<FakeState>,
    failing_attempts: usize,
    submit_delay: Duration,
    run_for: Duration,
    listed: bool,
}

impl FakeJobService {
    /// 默认：立即接受，启动后 1 秒完成
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(FakeState::default()),
            failing_attempts: 0,
            submit_delay: Duration::ZERO,
            run_for: Duration::from_secs(1),
            listed: true,
        }
    }

    /// 每个任务的前 n 次提交返回 503
    pub(crate) fn failing_attempts(mut self, n: usize) -> Self {
        self.failing_attempts = n;
        self
    }

    pub(crate) fn submit_delay(mut self, delay: Duration) -> Self {
        self.submit_delay = delay;
        self
    }

    pub(crate) fn run_for(mut self, duration: Duration) -> Self {
        self.run_for = duration;
        self
    }

    /// 任务被接受但永远不出现在列表中
    pub(crate) fn never_listed(mut self) -> Self {
        self.listed = false;
        self
    }

    pub(crate) fn submit_times(&self) -> Vec<Instant> {
        let state = self.state.lock().unwrap();
        let mut first_seen: Vec<Instant> = Vec::new();
        let mut seen = std::collections::HashSet::new();
        for (name, at) in &state.submits {
            if seen.insert(name.clone()) {
                first_seen.push(*at);
            }
        }
        first_seen
    }

    pub(crate) fn attempts(&self, job_name: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .attempts
            .get(job_name)
            .copied()
            .unwrap_or(0)
    }

    pub(crate) fn total_attempts(&self) -> usize {
        self.state.lock().unwrap().submits.len()
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.state.lock().unwrap().max_in_flight
    }
}

#[async_trait]
impl JobService for FakeJobService {
    async fn submit(&self, job_name: &str, items: &[String]) -> SubmitResponse {
        if items.iter().any(|item| item == PANIC_ITEM) {
            panic!("worker 内部故障: {}", job_name);
        }

        if !self.submit_delay.is_zero() {
            sleep(self.submit_delay).await;
        }

        let mut state = self.state.lock().unwrap();
        let now = Instant::now();
        state.submits.push((job_name.to_string(), now));
        let attempt = {
            let counter = state.attempts.entry(job_name.to_string()).or_insert(0);
            *counter += 1;
            *counter
        };

        if attempt <= self.failing_attempts {
            return SubmitResponse {
                accepted: false,
                status_code: 503,
                message: "Service Unavailable".to_string(),
            };
        }

        state.accepted_at.insert(job_name.to_string(), now);
        state.in_flight += 1;
        state.max_in_flight = state.max_in_flight.max(state.in_flight);
        SubmitResponse {
            accepted: true,
            status_code: 200,
            message: "OK".to_string(),
        }
    }

    async fn list_active(&self) -> HashMap<String, ActiveJob> {
        if !self.listed {
            return HashMap::new();
        }

        let mut state = self.state.lock().unwrap();
        let now = Instant::now();
        let accepted: Vec<(String, Instant)> = state
            .accepted_at
            .iter()
            .map(|(name, at)| (name.clone(), *at))
            .collect();

        let mut listing = HashMap::new();
        for (name, at) in accepted {
            let done = now.duration_since(at) >= self.run_for;
            if done && !state.finished.get(&name).copied().unwrap_or(false) {
                state.finished.insert(name.clone(), true);
                state.in_flight -= 1;
            }
            let (job_state, running) = if done { ("FINISHED", false) } else { ("RUNNING", true) };
            listing.insert(
                name,
                ActiveJob {
                    state: Some(job_state.to_string()),
                    running: Some(running),
                },
            );
        }
        listing
    }
}
