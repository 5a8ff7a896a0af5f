//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责整次运行的调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 应用入口
//! - 加载种子文件并生成启动计划
//! - 创建调度器，运行结束后写 RunLog
//! - 输出全局统计信息
//!
//! ### `dispatcher` - 批次调度器
//! - 按顺序启动批次
//! - 控制并发上限（Semaphore）和启动间隔
//! - 响应中断，等待已启动的批次结束
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<seeds 文件>)
//!     ↓
//! dispatcher (处理 Vec<PlannedBatch>)
//!     ↓
//! workflow::BatchFlow (处理单个批次)
//!     ↓
//! services (能力层：retry / monitor / recorder)
//!     ↓
//! clients (基础设施：JobService)
//! ```

pub mod batch_processor;
pub mod dispatcher;

// 重新导出主要类型
pub use batch_processor::App;
pub use dispatcher::{DispatchSummary, Dispatcher};
