use thiserror::Error;

/// 应用程序错误类型
///
/// 只覆盖"整个运行无法继续"的情况。单个批次的失败（提交失败、超时、
/// worker 内部异常）不是错误，而是 RunLog 中的一行结果。
#[derive(Debug, Error)]
pub enum AppError {
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// HTTP 客户端构建失败
    #[error("HTTP客户端错误: {0}")]
    Http(#[from] reqwest::Error),
    /// RunLog 序列化失败
    #[error("RunLog写入失败: {0}")]
    Csv(#[from] csv::Error),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 配置项取值非法
    #[error("配置项 {field} 非法: {reason}")]
    InvalidValue { field: &'static str, reason: String },
    /// 配置文件读取失败
    #[error("无法读取配置文件 {path}: {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 文件不存在
    #[error("文件不存在: {path}")]
    NotFound { path: String },
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建配置项非法错误
    pub fn invalid_config(field: &'static str, reason: impl Into<String>) -> Self {
        AppError::Config(ConfigError::InvalidValue {
            field,
            reason: reason.into(),
        })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source,
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
