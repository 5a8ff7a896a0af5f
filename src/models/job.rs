//! 任务模型
//!
//! 任务的真实状态只存在于远端服务，本地只做观察和记录。

use chrono::Utc;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

/// 任务生命周期状态
///
/// 远端的状态字符串大小写不统一，在边界处统一解析为枚举；
/// 不认识的字符串一律视为 `Unknown`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobState {
    /// 尚未在任务列表中出现，或状态无法识别
    Unknown,
    Running,
    Terminated,
    Finished,
    Stopped,
    Killed,
    Failed,
    Completed,
    /// 等待超过 max_wait
    Timeout,
    /// 提交重试耗尽，任务从未启动
    NotStarted,
    /// worker 内部异常
    UnknownError,
}

impl JobState {
    /// 解析远端返回的状态字符串（忽略大小写和首尾空白）
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "RUNNING" => JobState::Running,
            "TERMINATED" => JobState::Terminated,
            "FINISHED" => JobState::Finished,
            "STOPPED" => JobState::Stopped,
            "KILLED" => JobState::Killed,
            "FAILED" => JobState::Failed,
            "COMPLETED" => JobState::Completed,
            _ => JobState::Unknown,
        }
    }

    /// 是否为远端的终止状态
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Terminated
                | JobState::Finished
                | JobState::Stopped
                | JobState::Killed
                | JobState::Failed
                | JobState::Completed
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Unknown => "UNKNOWN",
            JobState::Running => "RUNNING",
            JobState::Terminated => "TERMINATED",
            JobState::Finished => "FINISHED",
            JobState::Stopped => "STOPPED",
            JobState::Killed => "KILLED",
            JobState::Failed => "FAILED",
            JobState::Completed => "COMPLETED",
            JobState::Timeout => "TIMEOUT",
            JobState::NotStarted => "NOT_STARTED",
            JobState::UnknownError => "UNKNOWN_ERROR",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 提交接口的返回
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitResponse {
    /// 是否被接受（2xx）
    pub accepted: bool,
    /// HTTP 状态码；没有收到响应时为 -1
    pub status_code: i32,
    /// 响应正文或诊断信息
    pub message: String,
}

impl SubmitResponse {
    /// 请求未能到达服务（网络错误、超时等）
    pub fn transport_failure(error: impl fmt::Display) -> Self {
        Self {
            accepted: false,
            status_code: -1,
            message: format!("EXCEPTION: {}", error),
        }
    }
}

/// 任务列表中某个任务的观察结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveJob {
    pub state: Option<String>,
    pub running: Option<bool>,
}

/// 任务名生成器
///
/// 名称格式 `{prefix}_{batch_index}_{unix_millis}`。时间戳在进程内严格递增，
/// 同一毫秒内的并发提交也不会重名。
#[derive(Debug, Default)]
pub struct JobNamer {
    last_millis: AtomicI64,
}

impl JobNamer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_name(&self, prefix: &str, batch_index: usize) -> String {
        let now = Utc::now().timestamp_millis();
        let previous = self
            .last_millis
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |prev| {
                Some(now.max(prev + 1))
            })
            .unwrap_or_else(|prev| prev);
        let stamp = now.max(previous + 1);
        format!("{}_{}_{}", prefix, batch_index, stamp)
    }
}

/// 单个批次的最终结果，创建后不再修改
#[derive(Debug, Clone, PartialEq)]
pub struct JobOutcome {
    /// 启动顺序（从1开始，跨种子文件全局递增），用于落盘排序
    pub launch_seq: usize,
    pub batch_index: usize,
    pub job_name: String,
    pub item_count: usize,
    pub start_accepted: bool,
    pub start_status: i32,
    pub start_message: String,
    pub final_state: JobState,
    pub duration: Duration,
}

/// RunLog 表头
pub const RUN_LOG_HEADER: [&str; 8] = [
    "batch_index",
    "job_name",
    "item_count",
    "start_accepted",
    "start_status",
    "start_message",
    "final_state",
    "duration_seconds",
];

/// RunLog 的一行
#[derive(Debug, Serialize)]
pub struct RunLogRow<'a> {
    pub batch_index: usize,
    pub job_name: &'a str,
    pub item_count: usize,
    pub start_accepted: bool,
    pub start_status: i32,
    pub start_message: &'a str,
    pub final_state: &'static str,
    pub duration_seconds: f64,
}

impl<'a> From<&'a JobOutcome> for RunLogRow<'a> {
    fn from(outcome: &'a JobOutcome) -> Self {
        Self {
            batch_index: outcome.batch_index,
            job_name: &outcome.job_name,
            item_count: outcome.item_count,
            start_accepted: outcome.start_accepted,
            start_status: outcome.start_status,
            start_message: &outcome.start_message,
            final_state: outcome.final_state.as_str(),
            duration_seconds: (outcome.duration.as_secs_f64() * 10.0).round() / 10.0,
        }
    }
}
