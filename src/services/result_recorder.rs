//! 结果记录服务 - 业务能力层
//!
//! 所有 worker 共享一个记录器，各自写入一行结果；运行结束后一次性追加到 RunLog。

use crate::error::{AppError, AppResult};
use crate::models::{JobOutcome, JobState, RunLogRow, RUN_LOG_HEADER};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{Mutex, PoisonError};
use tracing::debug;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// 运行统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    /// 提交成功并观察到终止状态
    pub finished: usize,
    pub not_started: usize,
    pub timed_out: usize,
    pub errors: usize,
}

/// 结果记录器
#[derive(Debug, Default)]
pub struct ResultRecorder {
    outcomes: Mutex<Vec<JobOutcome>>,
}

impl ResultRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一个批次的结果，可在任意 worker 中并发调用
    pub fn record(&self, outcome: JobOutcome) {
        debug!(
            "[批次 {}] 记录结果: {} {}",
            outcome.batch_index, outcome.job_name, outcome.final_state
        );
        self.outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(outcome);
    }

    pub fn len(&self) -> usize {
        self.outcomes.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 按启动顺序排列的结果副本
    pub fn snapshot(&self) -> Vec<JobOutcome> {
        let mut outcomes = self
            .outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        outcomes.sort_by_key(|o| o.launch_seq);
        outcomes
    }

    pub fn summary(&self) -> RunSummary {
        let outcomes = self.outcomes.lock().unwrap_or_else(PoisonError::into_inner);
        let mut summary = RunSummary {
            total: outcomes.len(),
            ..Default::default()
        };
        for outcome in outcomes.iter() {
            match outcome.final_state {
                JobState::NotStarted => summary.not_started += 1,
                JobState::Timeout => summary.timed_out += 1,
                JobState::UnknownError => summary.errors += 1,
                _ => summary.finished += 1,
            }
        }
        summary
    }

    /// 把全部结果追加写入 RunLog
    ///
    /// 文件不存在时先写 BOM 和表头；已存在时只追加数据行，历史记录不会被覆盖。
    /// 返回写入的数据行数。
    pub fn flush(&self, path: &Path) -> AppResult<usize> {
        let outcomes = self.snapshot();
        let new_file = !path.exists();

        let mut buffer = Vec::new();
        if new_file {
            buffer.extend_from_slice(UTF8_BOM);
        }
        {
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(&mut buffer);
            if new_file {
                writer.write_record(RUN_LOG_HEADER)?;
            }
            for outcome in &outcomes {
                writer.serialize(RunLogRow::from(outcome))?;
            }
            writer
                .flush()
                .map_err(|e| AppError::file_write_failed(path.display().to_string(), e))?;
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| AppError::file_write_failed(parent.display().to_string(), e))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| AppError::file_write_failed(path.display().to_string(), e))?;
        file.write_all(&buffer)
            .map_err(|e| AppError::file_write_failed(path.display().to_string(), e))?;

        Ok(outcomes.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    fn outcome(launch_seq: usize, final_state: JobState) -> JobOutcome {
        JobOutcome {
            launch_seq,
            batch_index: launch_seq,
            job_name: format!("p_{}_1700000000000", launch_seq),
            item_count: 50,
            start_accepted: final_state != JobState::NotStarted,
            start_status: if final_state == JobState::NotStarted { 503 } else { 200 },
            start_message: "msg, with comma".to_string(),
            final_state,
            duration: Duration::from_millis(1500),
        }
    }

    fn read_rows(path: &Path) -> (String, Vec<csv::StringRecord>) {
        let raw = fs::read_to_string(path).unwrap();
        let body = raw.strip_prefix('\u{feff}').unwrap_or(&raw).to_string();
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(body.as_bytes());
        let rows = reader.records().map(|r| r.unwrap()).collect();
        (raw, rows)
    }

    #[test]
    fn test_flush_new_file_writes_header_and_sorted_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crawls_log.csv");
        let recorder = ResultRecorder::new();
        recorder.record(outcome(2, JobState::Finished));
        recorder.record(outcome(1, JobState::NotStarted));

        assert_eq!(recorder.flush(&path).unwrap(), 2);

        let (raw, rows) = read_rows(&path);
        assert!(raw.starts_with('\u{feff}'));
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].iter().collect::<Vec<_>>(), RUN_LOG_HEADER.to_vec());
        assert_eq!(&rows[1][0], "1");
        assert_eq!(&rows[1][3], "false");
        assert_eq!(&rows[1][5], "msg, with comma");
        assert_eq!(&rows[1][6], "NOT_STARTED");
        assert_eq!(&rows[2][6], "FINISHED");
        assert_eq!(&rows[2][7], "1.5");
    }

    #[test]
    fn test_flush_appends_without_second_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("crawls_log.csv");

        let first = ResultRecorder::new();
        first.record(outcome(1, JobState::Finished));
        first.flush(&path).unwrap();

        let second = ResultRecorder::new();
        second.record(outcome(1, JobState::Timeout));
        second.flush(&path).unwrap();

        let (raw, rows) = read_rows(&path);
        assert_eq!(raw.matches("batch_index").count(), 1);
        assert_eq!(raw.matches('\u{feff}').count(), 1);
        assert_eq!(rows.len(), 3);
        assert_eq!(&rows[2][6], "TIMEOUT");
    }

    #[test]
    fn test_flush_empty_recorder_writes_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crawls_log.csv");

        assert_eq!(ResultRecorder::new().flush(&path).unwrap(), 0);

        let (_, rows) = read_rows(&path);
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_concurrent_record() {
        let recorder = Arc::new(ResultRecorder::new());
        let handles: Vec<_> = (1..=16)
            .map(|i| {
                let recorder = Arc::clone(&recorder);
                std::thread::spawn(move || recorder.record(outcome(i, JobState::Finished)))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(recorder.len(), 16);
        let seqs: Vec<usize> = recorder.snapshot().iter().map(|o| o.launch_seq).collect();
        assert_eq!(seqs, (1..=16).collect::<Vec<_>>());
    }

    #[test]
    fn test_summary_counts() {
        let recorder = ResultRecorder::new();
        recorder.record(outcome(1, JobState::Finished));
        recorder.record(outcome(2, JobState::Terminated));
        recorder.record(outcome(3, JobState::NotStarted));
        recorder.record(outcome(4, JobState::Timeout));
        recorder.record(outcome(5, JobState::UnknownError));

        assert_eq!(
            recorder.summary(),
            RunSummary {
                total: 5,
                finished: 2,
                not_started: 1,
                timed_out: 1,
                errors: 1,
            }
        );
    }
}
