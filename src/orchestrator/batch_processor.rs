//! 批量爬取启动器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责一次运行的完整生命周期：
//!
//! 1. **加载种子**：逐个读取种子文件，缺失或不可读的文件跳过
//! 2. **分批规划**：每个文件单独分批，批次序号在文件内从1开始
//! 3. **调度执行**：所有文件的批次共用一个并发上限，交给 `Dispatcher`
//! 4. **结果落盘**：全部结束后追加写入 RunLog，并输出统计

use crate::clients::{JobClient, JobService};
use crate::config::Config;
use crate::models::{extend_plan, job_prefix_for, load_seeds, split_into_batches, Batching, PlannedBatch};
use crate::orchestrator::Dispatcher;
use crate::services::{ResultRecorder, RunSummary};
use crate::utils::logging::{log_batches_planned, log_dispatch_start, log_startup, print_final_stats};
use crate::workflow::BatchFlow;
use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// 应用主结构
pub struct App {
    config: Config,
    service: Arc<dyn JobService>,
    cancel: CancellationToken,
}

impl App {
    /// 初始化应用：校验配置并创建 HTTP 客户端
    pub fn initialize(config: Config) -> Result<Self> {
        config.validate()?;
        let client = JobClient::new(&config)?;
        Ok(Self::with_service(config, Arc::new(client)))
    }

    /// 使用指定的任务服务创建应用
    pub fn with_service(config: Config, service: Arc<dyn JobService>) -> Self {
        Self {
            config,
            service,
            cancel: CancellationToken::new(),
        }
    }

    /// 取消后不再启动新批次，已启动的批次照常跑完并落盘
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<RunSummary> {
        log_startup(&self.config);

        let plan = self.plan_batches().await?;
        if plan.is_empty() {
            warn!("⚠️ 没有可用链接，程序结束");
            return Ok(RunSummary::default());
        }

        log_dispatch_start(plan.len(), &self.config);

        let recorder = Arc::new(ResultRecorder::new());
        let flow = Arc::new(BatchFlow::from_config(Arc::clone(&self.service), &self.config));
        let dispatcher = Dispatcher::new(
            flow,
            Arc::clone(&recorder),
            self.config.max_concurrency,
            self.config.launch_spacing,
        )
        .with_cancellation(self.cancel.clone());

        let dispatch = dispatcher.dispatch(plan).await;

        let run_log = Path::new(&self.config.run_log_file);
        let written = recorder.flush(run_log)?;
        info!("📝 已追加 {} 行到 {}", written, run_log.display());

        let summary = recorder.summary();
        print_final_stats(&dispatch, &summary, &self.config);

        Ok(summary)
    }

    /// 读取所有种子文件并生成启动计划
    async fn plan_batches(&self) -> Result<Vec<PlannedBatch>> {
        let batch_size = self.config.batch_size()?;
        let file_count = self.config.seeds_files.len();
        let mut plan = Vec::new();

        for seeds_file in &self.config.seeds_files {
            let path = Path::new(seeds_file);
            let seeds = match load_seeds(path).await {
                Ok(seeds) => seeds,
                Err(e) => {
                    error!("❌ 跳过种子文件 {}: {}", seeds_file, e);
                    continue;
                }
            };

            let prefix = job_prefix_for(path, self.config.job_name_prefix.as_deref(), file_count);
            match split_into_batches(&seeds, batch_size) {
                Batching::NoWork => {
                    warn!("[{}] 没有可用链接，跳过", prefix);
                }
                Batching::Ready(batches) => {
                    log_batches_planned(&prefix, batch_size.get(), batches.len());
                    extend_plan(&mut plan, &prefix, batches);
                }
            }
        }

        Ok(plan)
    }
}
