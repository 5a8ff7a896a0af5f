//! 程序配置
//!
//! 配置来源优先级（后者覆盖前者）：
//! 1. `Config::default()`
//! 2. `CRAWL_CONFIG` 指向的 TOML 文件
//! 3. 环境变量

use crate::error::{AppError, AppResult, ConfigError};
use serde::Deserialize;
use std::num::NonZeroUsize;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// 指向 TOML 配置文件的环境变量
pub const CONFIG_FILE_ENV: &str = "CRAWL_CONFIG";

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 任务管理服务地址
    pub service_base_url: String,
    /// 种子文件列表，每个文件独立分批
    pub seeds_files: Vec<String>,
    /// 每批链接数
    pub batch_size: usize,
    /// 任务名前缀；未设置时取种子文件名
    pub job_name_prefix: Option<String>,
    /// 提交时的任务类型
    pub job_type: String,
    /// 同时运行的任务数上限
    pub max_concurrency: usize,
    /// 相邻两次启动的最小间隔
    pub launch_spacing: Duration,
    /// 轮询任务列表的间隔
    pub poll_interval: Duration,
    /// 单个任务最长等待时间，超时记为 TIMEOUT
    pub max_wait: Duration,
    /// 提交最大尝试次数（含首次）
    pub max_start_attempts: u32,
    /// 重试退避基数，第 n 次失败后等待 n * base
    pub retry_base_delay: Duration,
    /// 单次 HTTP 请求超时
    pub http_timeout: Duration,
    /// 文本日志文件
    pub log_file: String,
    /// RunLog（CSV）文件
    pub run_log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_base_url: "http://localhost:8083".to_string(),
            seeds_files: vec!["seeds.txt".to_string()],
            batch_size: 50,
            job_name_prefix: None,
            job_type: "DeepCrawl".to_string(),
            max_concurrency: 4,
            launch_spacing: Duration::from_secs(60),
            poll_interval: Duration::from_secs(5),
            max_wait: Duration::from_secs(60 * 60),
            max_start_attempts: 3,
            retry_base_delay: Duration::from_secs(3),
            http_timeout: Duration::from_secs(30),
            log_file: "crawl_batch.log".to_string(),
            run_log_file: "crawls_log.csv".to_string(),
        }
    }
}

/// TOML 配置文件结构，所有字段可选
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    service_base_url: Option<String>,
    seeds_files: Option<Vec<String>>,
    batch_size: Option<usize>,
    job_name_prefix: Option<String>,
    job_type: Option<String>,
    max_concurrency: Option<usize>,
    launch_spacing_secs: Option<f64>,
    poll_interval_secs: Option<f64>,
    max_wait_secs: Option<f64>,
    max_start_attempts: Option<u32>,
    retry_base_delay_secs: Option<f64>,
    http_timeout_secs: Option<f64>,
    log_file: Option<String>,
    run_log_file: Option<String>,
}

impl Config {
    /// 完整加载：默认值 → 配置文件 → 环境变量，最后校验
    pub fn load() -> AppResult<Self> {
        let config = match std::env::var(CONFIG_FILE_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::from_toml_file(Path::new(path.trim()))?,
            _ => Self::default(),
        };
        let config = config.with_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// 默认值 + TOML 文件
    pub fn from_toml_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content, &path.display().to_string())
    }

    fn from_toml_str(content: &str, origin: &str) -> AppResult<Self> {
        let file: FileConfig =
            toml::from_str(content).map_err(|source| ConfigError::TomlParseFailed {
                path: origin.to_string(),
                source,
            })?;

        let mut config = Self::default();
        if let Some(v) = file.service_base_url {
            config.service_base_url = v;
        }
        if let Some(v) = file.seeds_files {
            config.seeds_files = v;
        }
        if let Some(v) = file.batch_size {
            config.batch_size = v;
        }
        if file.job_name_prefix.is_some() {
            config.job_name_prefix = file.job_name_prefix;
        }
        if let Some(v) = file.job_type {
            config.job_type = v;
        }
        if let Some(v) = file.max_concurrency {
            config.max_concurrency = v;
        }
        if let Some(v) = file.max_start_attempts {
            config.max_start_attempts = v;
        }
        if let Some(v) = file.log_file {
            config.log_file = v;
        }
        if let Some(v) = file.run_log_file {
            config.run_log_file = v;
        }

        let durations = [
            ("launch_spacing_secs", file.launch_spacing_secs, &mut config.launch_spacing),
            ("poll_interval_secs", file.poll_interval_secs, &mut config.poll_interval),
            ("max_wait_secs", file.max_wait_secs, &mut config.max_wait),
            ("retry_base_delay_secs", file.retry_base_delay_secs, &mut config.retry_base_delay),
            ("http_timeout_secs", file.http_timeout_secs, &mut config.http_timeout),
        ];
        for (field, secs, slot) in durations {
            if let Some(secs) = secs {
                *slot = Duration::try_from_secs_f64(secs)
                    .map_err(|_| AppError::invalid_config(field, format!("{} 不是合法的秒数", secs)))?;
            }
        }

        Ok(config)
    }

    /// 使用外部键值覆盖配置
    ///
    /// 无法解析的值保持原值不变。
    pub fn with_overrides(self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let string = |key: &str, current: String| lookup(key).unwrap_or(current);
        let secs = |key: &str, current: Duration| {
            lookup(key)
                .and_then(|v| v.trim().parse::<f64>().ok())
                .and_then(|v| Duration::try_from_secs_f64(v).ok())
                .unwrap_or(current)
        };

        let seeds_files = lookup("SEEDS_FILES")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect::<Vec<_>>()
            })
            .filter(|files| !files.is_empty())
            .unwrap_or(self.seeds_files);

        Self {
            service_base_url: string("SERVICE_BASE_URL", self.service_base_url),
            seeds_files,
            batch_size: parse_var(&lookup, "BATCH_SIZE").unwrap_or(self.batch_size),
            job_name_prefix: lookup("JOB_NAME_PREFIX")
                .filter(|v| !v.trim().is_empty())
                .or(self.job_name_prefix),
            job_type: string("JOB_TYPE", self.job_type),
            max_concurrency: parse_var(&lookup, "MAX_CONCURRENCY").unwrap_or(self.max_concurrency),
            launch_spacing: secs("LAUNCH_SPACING_SECS", self.launch_spacing),
            poll_interval: secs("POLL_INTERVAL_SECS", self.poll_interval),
            max_wait: secs("MAX_WAIT_SECS", self.max_wait),
            max_start_attempts: parse_var(&lookup, "MAX_START_ATTEMPTS").unwrap_or(self.max_start_attempts),
            retry_base_delay: secs("RETRY_BASE_DELAY_SECS", self.retry_base_delay),
            http_timeout: secs("HTTP_TIMEOUT_SECS", self.http_timeout),
            log_file: string("LOG_FILE", self.log_file),
            run_log_file: string("RUN_LOG_FILE", self.run_log_file),
        }
    }

    /// 校验配置
    pub fn validate(&self) -> AppResult<()> {
        self.batch_size()?;
        if self.max_concurrency == 0 {
            return Err(AppError::invalid_config("max_concurrency", "并发上限必须大于 0"));
        }
        if self.max_start_attempts == 0 {
            return Err(AppError::invalid_config(
                "max_start_attempts",
                "提交尝试次数必须大于 0",
            ));
        }
        if self.poll_interval.is_zero() {
            return Err(AppError::invalid_config("poll_interval", "轮询间隔必须大于 0"));
        }
        if self.seeds_files.is_empty() {
            return Err(AppError::invalid_config("seeds_files", "至少需要一个种子文件"));
        }
        Ok(())
    }

    /// 批大小（保证为正）
    pub fn batch_size(&self) -> AppResult<NonZeroUsize> {
        NonZeroUsize::new(self.batch_size)
            .ok_or_else(|| AppError::invalid_config("batch_size", "批大小必须大于 0"))
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|v| v.trim().parse().ok())
}
