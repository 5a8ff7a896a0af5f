//! 批次处理流程 - 流程层
//!
//! 核心职责：定义"一个批次"的完整生命周期
//!
//! 流程顺序：
//! 1. 提交任务（失败按线性退避重试）
//! 2. 重试耗尽 → 记为 NOT_STARTED
//! 3. 提交成功 → 轮询直到任务结束或超时

use std::sync::Arc;
use tracing::{error, info, warn};

use crate::clients::JobService;
use crate::config::Config;
use crate::models::JobOutcome;
use crate::services::{LifecycleMonitor, RetryPolicy};
use crate::utils::logging::truncate_text;
use crate::workflow::batch_ctx::BatchCtx;

/// 日志中提交响应正文的最大长度
const MESSAGE_PREVIEW_LEN: usize = 200;

/// 批次处理流程
///
/// - 不持有并发名额，名额由调度器管理
/// - 不写 RunLog，只返回结果
pub struct BatchFlow {
    service: Arc<dyn JobService>,
    retry: RetryPolicy,
    monitor: LifecycleMonitor,
}

impl BatchFlow {
    pub fn new(service: Arc<dyn JobService>, retry: RetryPolicy, monitor: LifecycleMonitor) -> Self {
        Self {
            service,
            retry,
            monitor,
        }
    }

    pub fn from_config(service: Arc<dyn JobService>, config: &Config) -> Self {
        let monitor = LifecycleMonitor::from_config(Arc::clone(&service), config);
        Self::new(service, RetryPolicy::from_config(config), monitor)
    }

    pub async fn run(&self, ctx: &BatchCtx, items: &[String]) -> JobOutcome {
        info!(
            "[批次 {}] 🚀 启动批次: 任务={}，链接数={}",
            ctx.batch_index, ctx.job_name, ctx.item_count
        );

        let service = &self.service;
        let response = self
            .retry
            .run(move |attempt| async move {
                let response = service.submit(&ctx.job_name, items).await;
                if response.accepted {
                    info!("[批次 {}] ✓ 任务提交成功（尝试 #{}）", ctx.batch_index, attempt);
                } else {
                    warn!(
                        "[批次 {}] ⚠️ 任务提交失败（尝试 #{}）: {} {}",
                        ctx.batch_index,
                        attempt,
                        response.status_code,
                        truncate_text(&response.message, MESSAGE_PREVIEW_LEN)
                    );
                }
                response
            })
            .await;

        if !response.accepted {
            error!(
                "[批次 {}] ❌ 启动失败，跳过等待: {} {}",
                ctx.batch_index,
                response.status_code,
                truncate_text(&response.message, MESSAGE_PREVIEW_LEN)
            );
            return ctx.not_started(response);
        }

        let observation = self.monitor.await_terminal(&ctx.job_name).await;
        ctx.finished(response, observation)
    }
}
