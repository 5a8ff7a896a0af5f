//! 批次模型与分批逻辑

use std::collections::HashSet;
use std::num::NonZeroUsize;

/// 一个批次：固定容量（最后一批可能不足）的有序链接列表
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// 批次序号（从1开始）
    pub index: usize,
    /// 本批链接
    pub items: Vec<String>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// 分批结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Batching {
    /// 没有可处理的链接
    NoWork,
    /// 按顺序排列的批次
    Ready(Vec<Batch>),
}

/// 去重，保留首次出现的顺序
///
/// 按字符串完全相等判断重复，不做任何清洗。
pub fn dedup_items<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for item in items {
        let item = item.as_ref();
        if seen.insert(item.to_string()) {
            out.push(item.to_string());
        }
    }
    out
}

/// 将链接按 `batch_size` 切分为批次
///
/// 输入先去重；按顺序拼接所有批次即可还原去重后的输入。
pub fn split_into_batches<S: AsRef<str>>(items: &[S], batch_size: NonZeroUsize) -> Batching {
    let unique = dedup_items(items);
    if unique.is_empty() {
        return Batching::NoWork;
    }

    let batches = unique
        .chunks(batch_size.get())
        .enumerate()
        .map(|(i, chunk)| Batch {
            index: i + 1,
            items: chunk.to_vec(),
        })
        .collect();

    Batching::Ready(batches)
}
