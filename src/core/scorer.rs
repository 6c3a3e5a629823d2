//! 启发式模式评分
//!
//! 无可用分类器时的单模态解读：
//! - 一致性: 相邻帧归一化欧氏相似度的均值
//! - 趋势: 每帧均值对帧序号的最小二乘斜率
//! - 模式名: 最新向量的 FNV-1a 指纹在目录中取模
//!
//! 模式名选择只是可复现的占位启发式，并非经过验证的分类器；
//! 各常数为策略取值，不是模型推导所得。

use tracing::debug;

use crate::buffer::ModalityBuffer;
use super::catalog::{PatternCatalog, EMOTION_LABELS};
use super::modality::Modality;
use super::result::{InferenceSource, ModalityExtra, ModalityResult};

// ============================================================
// 确定性指纹 (FNV-1a 64)
// ============================================================

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

fn fnv1a(hash: u64, bytes: &[u8]) -> u64 {
    bytes.iter().fold(hash, |h, b| (h ^ *b as u64).wrapping_mul(FNV_PRIME))
}

/// 特征向量指纹
///
/// 规范化序列化: 每个分量的 IEEE-754 位模式 (小端)，-0.0 视为 0.0，NaN 统一
pub fn fingerprint(vector: &[f32]) -> u64 {
    vector.iter().fold(FNV_OFFSET, |h, v| {
        let canonical = if *v == 0.0 {
            0.0f32
        } else if v.is_nan() {
            f32::NAN
        } else {
            *v
        };
        fnv1a(h, &canonical.to_bits().to_le_bytes())
    })
}

/// 标签序列指纹 (以 0x1f 分隔)
pub fn fingerprint_labels(labels: &[&str]) -> u64 {
    labels.iter().enumerate().fold(FNV_OFFSET, |h, (i, label)| {
        let h = if i > 0 { fnv1a(h, &[0x1f]) } else { h };
        fnv1a(h, label.as_bytes())
    })
}

// ============================================================
// 窗口统计
// ============================================================

/// 两个向量的相似度 [0,1]
///
/// 截断到较短长度；最大距离按特征取值 [0,2] 估计为 sqrt(len × 4)
pub fn similarity(a: &[f32], b: &[f32]) -> f32 {
    let n = a.len().min(b.len());
    if n == 0 {
        return 0.0;
    }

    let distance = a[..n]
        .iter()
        .zip(&b[..n])
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f32>()
        .sqrt();
    let max_distance = (n as f32 * 4.0).sqrt();

    1.0 - (distance / max_distance).min(1.0)
}

/// 相邻帧一致性均值
pub fn consistency(buffer: &ModalityBuffer) -> f32 {
    let frames = buffer.snapshot(buffer.len());
    if frames.len() < 2 {
        return 0.0;
    }

    let total: f32 = frames.windows(2).map(|w| similarity(w[0], w[1])).sum();
    (total / (frames.len() - 1) as f32).clamp(0.0, 1.0)
}

/// 强度趋势 [-1,1]
///
/// 每帧均值对帧序号做最小二乘拟合，斜率乘以帧数后截断
pub fn trend(buffer: &ModalityBuffer) -> f32 {
    let means: Vec<f32> = buffer
        .iter()
        .map(|v| if v.is_empty() { 0.0 } else { v.iter().sum::<f32>() / v.len() as f32 })
        .collect();
    let n = means.len();
    if n < 2 {
        return 0.0;
    }

    let x_mean = (n - 1) as f32 / 2.0;
    let y_mean = means.iter().sum::<f32>() / n as f32;

    let (num, den) = means.iter().enumerate().fold((0.0f32, 0.0f32), |(num, den), (i, y)| {
        let dx = i as f32 - x_mean;
        (num + dx * (y - y_mean), den + dx * dx)
    });
    if den == 0.0 {
        return 0.0;
    }

    (num / den * n as f32).clamp(-1.0, 1.0)
}

/// 每分钟眨眼估计：第三分量均值 × 60，无数据时 12.0
pub fn blink_rate(buffer: &ModalityBuffer) -> f32 {
    let samples: Vec<f32> = buffer.iter().filter_map(|v| v.get(2).copied()).collect();
    if samples.is_empty() {
        return 12.0;
    }
    samples.iter().sum::<f32>() / samples.len() as f32 * 60.0
}

/// 最新表情向量中最大分量对应的标签 (至少 5 维)
pub fn dominant_emotion(latest: &[f32]) -> Option<&'static str> {
    if latest.len() < EMOTION_LABELS.len() {
        return None;
    }

    let mut best = 0;
    for (i, v) in latest.iter().take(EMOTION_LABELS.len()).enumerate() {
        if *v > latest[best] {
            best = i;
        }
    }
    Some(EMOTION_LABELS[best])
}

// ============================================================
// 启发式评分器
// ============================================================

/// 启发式评分器
#[derive(Debug, Clone)]
pub struct HeuristicScorer {
    /// 冷启动阈值
    min_frames: usize,
}

impl HeuristicScorer {
    pub fn new(min_frames: usize) -> Self {
        Self { min_frames }
    }

    /// 对模态缓冲区评分
    pub fn score(&self, modality: Modality, buffer: &ModalityBuffer) -> ModalityResult {
        let len = buffer.len();
        let latest = match buffer.latest() {
            Some(v) if len >= self.min_frames => v,
            _ => return ModalityResult::unknown(modality, len),
        };

        let consistency = consistency(buffer);
        let entry = PatternCatalog::for_modality(modality).pick(fingerprint(latest));

        let mut extra = ModalityExtra {
            source: InferenceSource::Heuristic,
            consistency: Some(consistency),
            ..Default::default()
        };

        let confidence = match modality {
            Modality::Gesture => (0.5 + 0.5 * consistency).min(0.95),
            Modality::Gaze => {
                extra.blink_rate = Some(blink_rate(buffer));
                (0.4 + 0.6 * consistency).min(0.90)
            }
            Modality::Emotion => {
                let trend = trend(buffer);
                extra.trend = Some(trend);
                extra.dominant_emotion = dominant_emotion(latest);
                (0.45 + 0.3 * consistency + 0.25 * trend.abs()).min(0.95)
            }
        };

        debug!(
            "{} 启发式: pattern={} consistency={:.3} confidence={:.3}",
            modality, entry.name, consistency, confidence
        );

        ModalityResult {
            modality,
            pattern: entry.name.to_string(),
            confidence: confidence.max(0.0),
            meaning: entry.meaning.to_string(),
            description: entry.description.to_string(),
            duration_frames: len,
            extra,
        }
    }
}

impl Default for HeuristicScorer {
    fn default() -> Self {
        Self::new(3)
    }
}
