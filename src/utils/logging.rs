//! 日志工具模块
//!
//! 负责初始化 tracing，并提供运行各阶段的日志输出函数

use crate::config::Config;
use crate::orchestrator::DispatchSummary;
use crate::services::RunSummary;
use anyhow::Result;
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// 初始化日志：同时输出到终端和日志文件
///
/// 默认级别为 info，可用 `RUST_LOG` 覆盖。
///
/// # 参数
/// - `log_file_path`: 日志文件路径（追加写入）
pub fn init(log_file_path: &str) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .try_init()?;

    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 并发批次爬取模式");
    info!("🌐 任务服务: {}", config.service_base_url);
    info!(
        "📊 并发上限: {}，启动间隔: {}s",
        config.max_concurrency,
        config.launch_spacing.as_secs_f64()
    );
    info!(
        "⏱️ 轮询间隔: {}s，单任务最长等待: {}s",
        config.poll_interval.as_secs_f64(),
        config.max_wait.as_secs_f64()
    );
    info!("{}", "=".repeat(60));
}

/// 记录某个种子文件的分批信息
///
/// # 参数
/// - `prefix`: 任务名前缀
/// - `batch_size`: 每批链接数
/// - `batch_count`: 批次数
pub fn log_batches_planned(prefix: &str, batch_size: usize, batch_count: usize) {
    info!("[{}] 按 {}/批，共 {} 批", prefix, batch_size, batch_count);
}

/// 记录调度开始信息
pub fn log_dispatch_start(total_batches: usize, config: &Config) {
    info!("\n{}", "=".repeat(60));
    info!("📦 共 {} 个批次待启动", total_batches);
    info!(
        "📋 同时最多 {} 个任务，相邻启动至少间隔 {}s",
        config.max_concurrency,
        config.launch_spacing.as_secs_f64()
    );
    info!("{}", "=".repeat(60));
}

/// 打印最终统计信息
///
/// # 参数
/// - `dispatch`: 调度统计
/// - `run`: 结果统计
/// - `config`: 配置（用于输出文件路径）
pub fn print_final_stats(dispatch: &DispatchSummary, run: &RunSummary, config: &Config) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部批次处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("🚀 已启动: {}/{}", dispatch.launched, dispatch.planned);
    if dispatch.interrupted {
        info!("⛔ 因中断未启动: {}", dispatch.planned - dispatch.launched);
    }
    info!("✅ 正常结束: {}", run.finished);
    info!("⌛ 等待超时: {}", run.timed_out);
    info!("❌ 启动失败: {}", run.not_started);
    info!("💥 执行异常: {}", run.errors);
    info!("{}", "=".repeat(60));
    info!("\n日志见: {} / {}", config.log_file, config.run_log_file);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大字符数
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
