//! # Crawl Batch Submit
//!
//! 把大量种子链接分批提交给远端爬虫任务服务，并控制同时运行的任务数
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Clients）
//! - `clients/` - 与任务服务通信，只暴露能力
//! - `JobService` - 提交任务、列出任务
//! - `JobClient` - 基于 HTTP 的实现
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个任务
//! - `RetryPolicy` - 线性退避重试
//! - `LifecycleMonitor` - 轮询直到任务结束或超时
//! - `ResultRecorder` - 收集结果并写 RunLog
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个批次"的完整处理流程
//! - `BatchCtx` - 上下文封装（启动序号 + 批次序号 + 任务名）
//! - `BatchFlow` - 流程编排（submit → retry → monitor）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 应用入口，加载种子、写 RunLog
//! - `orchestrator/dispatcher` - 批次调度器，管理并发和启动间隔
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{JobClient, JobService};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{Batch, JobOutcome, JobState};
pub use orchestrator::{App, DispatchSummary, Dispatcher};
pub use services::RunSummary;
pub use workflow::{BatchCtx, BatchFlow};
