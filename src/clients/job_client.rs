//! 任务管理服务客户端
//!
//! 封装"提交任务"和"列出任务"两个接口。所有失败都作为普通返回值交给调用方，
//! 不向上抛错，方便重试。

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::{ActiveJob, SubmitResponse};
use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use tracing::{debug, warn};

/// 远端任务服务的能力
#[async_trait]
pub trait JobService: Send + Sync {
    /// 提交任务：`POST /jobs/{name}/start`
    async fn submit(&self, job_name: &str, items: &[String]) -> SubmitResponse;

    /// 列出任务：`GET /jobs`
    ///
    /// 服务不可达时返回空表，调用方应视为"没有新信息"，而不是"没有任务"。
    async fn list_active(&self) -> HashMap<String, ActiveJob>;
}

/// 基于 HTTP 的任务服务客户端
#[derive(Clone)]
pub struct JobClient {
    http: reqwest::Client,
    base_url: Url,
    job_type: String,
}

impl JobClient {
    /// 创建新的客户端
    pub fn new(config: &Config) -> AppResult<Self> {
        let base_url = Url::parse(&config.service_base_url).map_err(|e| {
            AppError::invalid_config("service_base_url", format!("{}: {}", config.service_base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::invalid_config(
                "service_base_url",
                format!("{} 不能作为基础地址", config.service_base_url),
            ));
        }

        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;

        Ok(Self {
            http,
            base_url,
            job_type: config.job_type.clone(),
        })
    }

    /// 在基础地址后追加路径段（自动编码）
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

#[async_trait]
impl JobService for JobClient {
    async fn submit(&self, job_name: &str, items: &[String]) -> SubmitResponse {
        let url = self.endpoint(&["jobs", job_name, "start"]);
        let payload = json!({
            "type": self.job_type,
            "seeds": items,
            "model": null,
        });

        debug!("提交任务 {}，链接数: {}", job_name, items.len());

        let response = match self.http.post(url).json(&payload).send().await {
            Ok(response) => response,
            Err(e) => return SubmitResponse::transport_failure(e),
        };

        let status = response.status();
        match response.text().await {
            Ok(text) => SubmitResponse {
                accepted: status.is_success(),
                status_code: i32::from(status.as_u16()),
                message: text.trim().to_string(),
            },
            Err(e) => SubmitResponse {
                accepted: false,
                status_code: i32::from(status.as_u16()),
                message: format!("无法读取响应: {}", e),
            },
        }
    }

    async fn list_active(&self) -> HashMap<String, ActiveJob> {
        let url = self.endpoint(&["jobs"]);

        let response = match self.http.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("拉取任务列表失败: {}", e);
                return HashMap::new();
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!("拉取任务列表失败: HTTP {}", status);
            return HashMap::new();
        }

        match response.text().await {
            Ok(body) => parse_listing(&body).unwrap_or_else(|e| {
                warn!("任务列表解析失败: {}", e);
                HashMap::new()
            }),
            Err(e) => {
                warn!("拉取任务列表失败: {}", e);
                HashMap::new()
            }
        }
    }
}

/// 任务列表响应：`{"jobs": [...]}`（兼容 `crawlers`）或直接是数组
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JobListing {
    Bare(Vec<JobDescriptor>),
    Wrapped {
        #[serde(default, alias = "crawlers")]
        jobs: Vec<JobDescriptor>,
    },
}

#[derive(Debug, Deserialize)]
struct JobDescriptor {
    #[serde(alias = "crawlerId")]
    id: Option<String>,
    #[serde(alias = "crawlerState")]
    state: Option<String>,
    #[serde(alias = "crawlerRunning")]
    running: Option<bool>,
}

/// 把任务列表正文解析为 `任务名 → 状态` 映射
///
/// 空正文视为空表；没有 id 的条目被忽略。
fn parse_listing(body: &str) -> Result<HashMap<String, ActiveJob>, serde_json::Error> {
    if body.trim().is_empty() {
        return Ok(HashMap::new());
    }

    let descriptors = match serde_json::from_str::<JobListing>(body)? {
        JobListing::Bare(list) => list,
        JobListing::Wrapped { jobs } => jobs,
    };

    Ok(descriptors
        .into_iter()
        .filter_map(|d| {
            let id = d.id.filter(|id| !id.is_empty())?;
            Some((
                id,
                ActiveJob {
                    state: d.state,
                    running: d.running,
                },
            ))
        })
        .collect())
}
