//! 批次处理上下文
//!
//! 封装"我正在处理第几个启动的、哪个批次、叫什么名字的任务"这一信息

use crate::models::{JobOutcome, JobState, SubmitResponse};
use crate::services::TerminalObservation;
use std::fmt::Display;
use std::time::Duration;

/// 批次处理上下文
#[derive(Debug, Clone)]
pub struct BatchCtx {
    /// 全局启动顺序（从1开始）
    pub launch_seq: usize,

    /// 批次在所属种子文件中的序号（从1开始）
    pub batch_index: usize,

    /// 远端任务名
    pub job_name: String,

    /// 本批链接数
    pub item_count: usize,
}

impl BatchCtx {
    pub fn new(launch_seq: usize, batch_index: usize, job_name: String, item_count: usize) -> Self {
        Self {
            launch_seq,
            batch_index,
            job_name,
            item_count,
        }
    }

    /// 提交重试耗尽，任务从未启动
    pub fn not_started(&self, response: SubmitResponse) -> JobOutcome {
        self.outcome(response, JobState::NotStarted, Duration::ZERO)
    }

    /// 任务已提交并等待结束（或超时）
    pub fn finished(&self, response: SubmitResponse, observation: TerminalObservation) -> JobOutcome {
        self.outcome(response, observation.state, observation.elapsed)
    }

    /// worker 内部异常
    pub fn worker_error(&self, message: impl Display) -> JobOutcome {
        let response = SubmitResponse {
            accepted: false,
            status_code: -1,
            message: format!("EXCEPTION: {}", message),
        };
        self.outcome(response, JobState::UnknownError, Duration::ZERO)
    }

    fn outcome(&self, response: SubmitResponse, final_state: JobState, duration: Duration) -> JobOutcome {
        JobOutcome {
            launch_seq: self.launch_seq,
            batch_index: self.batch_index,
            job_name: self.job_name.clone(),
            item_count: self.item_count,
            start_accepted: response.accepted,
            start_status: response.status_code,
            start_message: response.message,
            final_state,
            duration,
        }
    }
}

impl Display for BatchCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[批次 #{} 任务 {} 链接数 {}]",
            self.batch_index, self.job_name, self.item_count
        )
    }
}
