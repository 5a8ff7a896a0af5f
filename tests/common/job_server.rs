//! 集成测试用的最小任务服务
//!
//! 支持 `POST /jobs/{name}/start` 和 `GET /jobs`，每个连接只处理一个请求。

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
pub struct JobServerOptions {
    /// 每个任务的前 n 次提交返回 503
    pub failing_attempts: usize,
    /// false 时接受的任务永远不出现在列表中
    pub listed: bool,
    /// 任务被接受后运行多久变为 FINISHED
    pub run_for: Duration,
}

impl Default for JobServerOptions {
    fn default() -> Self {
        Self {
            failing_attempts: 0,
            listed: true,
            run_for: Duration::from_millis(100),
        }
    }
}

#[derive(Debug, Default)]
struct ServerState {
    attempts: HashMap<String, usize>,
    accepted: HashMap<String, Instant>,
    seeds: HashMap<String, usize>,
    job_types: Vec<String>,
}

/// 服务句柄，可读取收到的请求统计
#[derive(Clone)]
pub struct JobServer {
    pub base_url: String,
    state: Arc<Mutex<ServerState>>,
}

impl JobServer {
    pub fn attempts(&self, job_name: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .attempts
            .get(job_name)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_attempts(&self) -> usize {
        self.state.lock().unwrap().attempts.values().sum()
    }

    /// 被接受任务的链接数，按任务名排序
    pub fn accepted_seed_counts(&self) -> Vec<(String, usize)> {
        let mut counts: Vec<(String, usize)> = self
            .state
            .lock()
            .unwrap()
            .seeds
            .iter()
            .map(|(name, n)| (name.clone(), *n))
            .collect();
        counts.sort();
        counts
    }

    pub fn job_types(&self) -> Vec<String> {
        self.state.lock().unwrap().job_types.clone()
    }
}

pub fn start() -> JobServer {
    start_with_options(JobServerOptions::default())
}

pub fn start_with_options(opts: JobServerOptions) -> JobServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let state = Arc::new(Mutex::new(ServerState::default()));
    let server_state = Arc::clone(&state);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let state = Arc::clone(&server_state);
            thread::spawn(move || handle(stream, &state, opts));
        }
    });
    JobServer {
        base_url: format!("http://127.0.0.1:{}/", port),
        state,
    }
}

fn handle(mut stream: TcpStream, state: &Mutex<ServerState>, opts: JobServerOptions) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let Some((method, path, body)) = read_request(&mut stream) else {
        return;
    };

    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
    let (status, response_body) = match (method.as_str(), segments.as_slice()) {
        ("POST", ["jobs", name, "start"]) => start_job(state, opts, name, &body),
        ("GET", ["jobs"]) => list_jobs(state, opts),
        _ => ("404 Not Found", "not found".to_string()),
    };

    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        response_body.len(),
        response_body
    );
    let _ = stream.write_all(response.as_bytes());
}

fn start_job(
    state: &Mutex<ServerState>,
    opts: JobServerOptions,
    name: &str,
    body: &[u8],
) -> (&'static str, String) {
    let mut state = state.lock().unwrap();
    let attempt = {
        let counter = state.attempts.entry(name.to_string()).or_insert(0);
        *counter += 1;
        *counter
    };
    if attempt <= opts.failing_attempts {
        return ("503 Service Unavailable", "Service Unavailable".to_string());
    }

    let payload: serde_json::Value = match serde_json::from_slice(body) {
        Ok(payload) => payload,
        Err(_) => return ("400 Bad Request", "bad json".to_string()),
    };
    let seeds = payload["seeds"].as_array().map_or(0, |s| s.len());
    let job_type = payload["type"].as_str().unwrap_or_default().to_string();

    state.seeds.insert(name.to_string(), seeds);
    state.job_types.push(job_type);
    state.accepted.insert(name.to_string(), Instant::now());
    ("200 OK", format!("{{\"message\":\"Crawler {} started\"}}", name))
}

fn list_jobs(state: &Mutex<ServerState>, opts: JobServerOptions) -> (&'static str, String) {
    if !opts.listed {
        return ("200 OK", "{\"crawlers\":[]}".to_string());
    }

    let state = state.lock().unwrap();
    let crawlers: Vec<serde_json::Value> = state
        .accepted
        .iter()
        .map(|(name, at)| {
            let done = at.elapsed() >= opts.run_for;
            serde_json::json!({
                "crawlerId": name,
                "crawlerState": if done { "FINISHED" } else { "RUNNING" },
                "crawlerRunning": !done,
            })
        })
        .collect();
    ("200 OK", serde_json::json!({ "crawlers": crawlers }).to_string())
}

/// 读取请求行、头部和 Content-Length 指定长度的正文
fn read_request(stream: &mut TcpStream) -> Option<(String, String, Vec<u8>)> {
    let mut data = Vec::new();
    let mut buf = [0u8; 8192];
    let header_end = loop {
        let n = stream.read(&mut buf).ok()?;
        if n == 0 {
            return None;
        }
        data.extend_from_slice(&buf[..n]);
        if let Some(pos) = data.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = std::str::from_utf8(&data[..header_end]).ok()?.to_string();
    let mut lines = head.lines();
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();
    let content_length = lines
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while data.len() < header_end + content_length {
        let n = stream.read(&mut buf).ok()?;
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buf[..n]);
    }
    let body = data[header_end..].to_vec();
    Some((method, path, body))
}
