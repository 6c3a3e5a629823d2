//! 模态缓冲区
//!
//! 单一模态 (手势 / 注视 / 表情) 的定长滚动窗口

use std::collections::VecDeque;
use ndarray::Array2;

/// 特征向量
///
/// 同一模态流内长度应保持一致，推入后不再修改
pub type FeatureVector = Vec<f32>;

/// 模态缓冲区
///
/// FIFO 环形窗口：超出 `max_history` 时从队首丢弃最旧的帧。
/// 由引擎独占持有，外部只读。
#[derive(Debug, Clone)]
pub struct ModalityBuffer {
    frames: VecDeque<FeatureVector>,
    max_history: usize,
}

impl ModalityBuffer {
    /// 创建新的模态缓冲区
    ///
    /// # Arguments
    /// * `max_history` - 最大帧数 (默认 30)
    pub fn new(max_history: usize) -> Self {
        Self {
            frames: VecDeque::with_capacity(max_history),
            max_history,
        }
    }

    /// 添加特征向量
    pub fn push(&mut self, vector: FeatureVector) {
        self.frames.push_back(vector);
        while self.frames.len() > self.max_history {
            self.frames.pop_front();
        }
    }

    /// 获取最近的 N 帧 (不足 N 帧时返回全部)，按时间顺序
    pub fn snapshot(&self, count: usize) -> Vec<&[f32]> {
        let n = count.min(self.frames.len());
        self.frames
            .iter()
            .skip(self.frames.len() - n)
            .map(|v| v.as_slice())
            .collect()
    }

    /// 迭代全部帧 (旧 → 新)
    pub fn iter(&self) -> impl Iterator<Item = &[f32]> + '_ {
        self.frames.iter().map(|v| v.as_slice())
    }

    /// 最新一帧
    pub fn latest(&self) -> Option<&[f32]> {
        self.frames.back().map(|v| v.as_slice())
    }

    /// 最近 N 帧组成的矩阵 (帧 × 特征)
    ///
    /// 列数按窗口内最短向量截断；帧数不足 N 时返回 None
    pub fn window_matrix(&self, count: usize) -> Option<Array2<f32>> {
        if count == 0 || self.frames.len() < count {
            return None;
        }

        let window = self.snapshot(count);
        let dim = window.iter().map(|v| v.len()).min().unwrap_or(0);
        if dim == 0 {
            return None;
        }

        let mut matrix = Array2::zeros((count, dim));
        for (i, frame) in window.iter().enumerate() {
            for (j, value) in frame.iter().take(dim).enumerate() {
                matrix[[i, j]] = *value;
            }
        }

        Some(matrix)
    }

    /// 清空缓冲区
    pub fn clear(&mut self) {
        self.frames.clear();
    }

    /// 获取帧数
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn max_history(&self) -> usize {
        self.max_history
    }
}

impl Default for ModalityBuffer {
    fn default() -> Self {
        Self::new(30)
    }
}
