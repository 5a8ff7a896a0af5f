//! 运行计划：多个种子文件各自分批后，按文件顺序排成一条启动队列

use crate::models::batch::Batch;
use std::path::Path;

/// 一个待启动的批次及其任务名前缀
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedBatch {
    pub prefix: String,
    pub batch: Batch,
}

/// 计算种子文件对应的任务名前缀
///
/// - 未配置前缀：使用文件名（去掉目录和扩展名）
/// - 配置了前缀且只有一个文件：直接使用配置的前缀
/// - 配置了前缀且有多个文件：`{prefix}_{文件名}`，避免不同文件的任务重名
pub fn job_prefix_for(seeds_file: &Path, configured: Option<&str>, file_count: usize) -> String {
    let stem = seeds_file
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "seeds".to_string());

    match configured {
        Some(prefix) if file_count <= 1 => prefix.to_string(),
        Some(prefix) => format!("{}_{}", prefix, stem),
        None => stem,
    }
}

/// 把某个文件的批次追加进计划
pub fn extend_plan(plan: &mut Vec<PlannedBatch>, prefix: &str, batches: Vec<Batch>) {
    plan.extend(batches.into_iter().map(|batch| PlannedBatch {
        prefix: prefix.to_string(),
        batch,
    }));
}
