use crate::error::{AppResult, FileError};
use crate::models::batch::dedup_items;
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;

/// 读取种子文件（每行一个链接），去空行、去重并保留首次出现顺序
pub async fn load_seeds(seeds_file_path: &Path) -> AppResult<Vec<String>> {
    let path = seeds_file_path.display().to_string();
    let content = fs::read_to_string(seeds_file_path)
        .await
        .map_err(|source| match source.kind() {
            ErrorKind::NotFound => FileError::NotFound { path },
            _ => FileError::ReadFailed { path, source },
        })?;

    let seeds = dedup_items(
        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty()),
    );
    tracing::info!(
        "[{}] 总链接数: {}",
        seeds_file_path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy(),
        seeds.len()
    );

    Ok(seeds)
}
