//! 批次调度器 - 编排层
//!
//! ## 职责
//!
//! 按顺序把批次交给 worker，并保证：
//!
//! 1. **并发上限**：Semaphore 名额在调度循环里获取，名额满时循环本身阻塞，
//!    同时运行的任务数任何时刻都不超过上限
//! 2. **启动间隔**：每启动一个 worker 后至少等待 `launch_spacing`，
//!    即使并发还有空位
//! 3. **结果完整**：每个已启动的批次都恰好产生一行结果；worker 内部 panic
//!    会被转换为 `UNKNOWN_ERROR`，不会影响其他批次
//! 4. **协作式中断**：取消后不再启动新批次，已启动的 worker 照常跑完

use crate::models::{JobNamer, PlannedBatch};
use crate::services::ResultRecorder;
use crate::workflow::{BatchCtx, BatchFlow};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// 调度统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSummary {
    /// 计划中的批次数
    pub planned: usize,
    /// 实际启动的批次数
    pub launched: usize,
    /// 是否因中断提前停止启动
    pub interrupted: bool,
}

/// 批次调度器
pub struct Dispatcher {
    flow: Arc<BatchFlow>,
    recorder: Arc<ResultRecorder>,
    namer: JobNamer,
    max_concurrency: usize,
    launch_spacing: Duration,
    cancel: CancellationToken,
}

impl Dispatcher {
    pub fn new(
        flow: Arc<BatchFlow>,
        recorder: Arc<ResultRecorder>,
        max_concurrency: usize,
        launch_spacing: Duration,
    ) -> Self {
        Self {
            flow,
            recorder,
            namer: JobNamer::new(),
            max_concurrency: max_concurrency.max(1),
            launch_spacing,
            cancel: CancellationToken::new(),
        }
    }

    /// 使用外部传入的取消令牌
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// 用于外部中断的取消令牌
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// 按顺序启动所有批次，并等待已启动的批次全部结束
    pub async fn dispatch(&self, plan: Vec<PlannedBatch>) -> DispatchSummary {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut summary = DispatchSummary {
            planned: plan.len(),
            ..Default::default()
        };
        let mut handles = Vec::with_capacity(plan.len());

        let mut queue = plan.into_iter().peekable();
        while let Some(planned) = queue.next() {
            if self.cancel.is_cancelled() {
                summary.interrupted = true;
                break;
            }

            // 名额满时在这里阻塞，直到某个 worker 结束
            let permit = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => None,
                permit = Arc::clone(&semaphore).acquire_owned() => permit.ok(),
            };
            let Some(permit) = permit else {
                summary.interrupted = true;
                break;
            };

            summary.launched += 1;
            let PlannedBatch { prefix, batch } = planned;
            let ctx = BatchCtx::new(
                summary.launched,
                batch.index,
                self.namer.next_name(&prefix, batch.index),
                batch.items.len(),
            );

            let flow = Arc::clone(&self.flow);
            let recorder = Arc::clone(&self.recorder);
            let worker_ctx = ctx.clone();
            let handle = tokio::spawn(async move {
                let _permit = permit;
                let ctx = worker_ctx;
                let outcome = match AssertUnwindSafe(flow.run(&ctx, &batch.items))
                    .catch_unwind()
                    .await
                {
                    Ok(outcome) => outcome,
                    Err(panic) => {
                        let message = panic_message(panic.as_ref());
                        error!("[批次 {}] 💥 执行异常: {}", ctx.batch_index, message);
                        ctx.worker_error(message)
                    }
                };
                recorder.record(outcome);
            });
            handles.push((ctx, handle));

            // 即使并发未满，相邻两次启动也至少间隔 launch_spacing；最后一批之后不再等待
            if !self.launch_spacing.is_zero() && queue.peek().is_some() {
                tokio::select! {
                    _ = self.cancel.cancelled() => {}
                    _ = sleep(self.launch_spacing) => {}
                }
            }
        }

        if summary.interrupted {
            warn!(
                "⛔ 收到中断信号，已停止启动新批次（已启动 {}/{}），等待已启动的批次结束...",
                summary.launched, summary.planned
            );
        }

        for (ctx, handle) in handles {
            if let Err(e) = handle.await {
                // worker 在记录结果之前就退出了，补记一行
                error!("[批次 {}] 任务执行失败: {}", ctx.batch_index, e);
                self.recorder.record(ctx.worker_error(e));
            }
        }

        info!("✓ 已启动的 {} 个批次全部结束", summary.launched);
        summary
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "未知 panic".to_string()
    }
}
