//! 融合结果类型
//!
//! 每次 `process` 调用内创建、返回后即丢弃，引擎不保留历史

use serde::Serialize;

use super::modality::Modality;

/// 单模态结果来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InferenceSource {
    /// 帧数不足
    #[default]
    ColdStart,
    /// 启发式评分
    Heuristic,
    /// 已注册分类器
    Learned,
}

/// 模态特有字段
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ModalityExtra {
    pub source: InferenceSource,
    /// 窗口内相邻帧一致性 [0,1]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consistency: Option<f32>,
    /// 表情强度趋势 [-1,1]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend: Option<f32>,
    /// 每分钟眨眼估计
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blink_rate: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dominant_emotion: Option<&'static str>,
    /// 分类器标签对应的意图
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
}

/// 单模态解读
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModalityResult {
    pub modality: Modality,
    pub pattern: String,
    pub confidence: f32,
    pub meaning: String,
    pub description: String,
    pub duration_frames: usize,
    pub extra: ModalityExtra,
}

impl ModalityResult {
    /// 冷启动结果
    pub fn unknown(modality: Modality, duration_frames: usize) -> Self {
        Self {
            modality,
            pattern: "unknown".to_string(),
            confidence: 0.0,
            meaning: "insufficient data".to_string(),
            description: "too few observations".to_string(),
            duration_frames,
            extra: ModalityExtra::default(),
        }
    }
}

/// 参与融合的模态及其模式
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Contribution {
    pub modality: Modality,
    pub pattern: String,
}

/// 多模态组合解读
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombinedResult {
    pub pattern: String,
    pub confidence: f32,
    pub meaning: String,
    pub description: String,
    pub contributing: Vec<Contribution>,
}

impl CombinedResult {
    /// 输入不足时的结果
    pub fn unclear() -> Self {
        Self {
            pattern: "unclear".to_string(),
            confidence: 0.0,
            meaning: "insufficient data for multimodal analysis".to_string(),
            description: "no consistent multimodal pattern".to_string(),
            contributing: Vec::new(),
        }
    }
}

/// 主结果类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimaryType {
    Gesture,
    Gaze,
    Emotion,
    Combined,
}

impl PrimaryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gesture => "gesture",
            Self::Gaze => "gaze",
            Self::Emotion => "emotion",
            Self::Combined => "combined",
        }
    }
}

impl From<Modality> for PrimaryType {
    fn from(modality: Modality) -> Self {
        match modality {
            Modality::Gesture => Self::Gesture,
            Modality::Gaze => Self::Gaze,
            Modality::Emotion => Self::Emotion,
        }
    }
}

/// 被选为主结果的解读
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PrimaryResult {
    Modality(ModalityResult),
    Combined(CombinedResult),
}

impl PrimaryResult {
    pub fn confidence(&self) -> f32 {
        match self {
            Self::Modality(r) => r.confidence,
            Self::Combined(r) => r.confidence,
        }
    }

    pub fn pattern(&self) -> &str {
        match self {
            Self::Modality(r) => &r.pattern,
            Self::Combined(r) => &r.pattern,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Self::Modality(r) => &r.description,
            Self::Combined(r) => &r.description,
        }
    }

    pub fn meaning(&self) -> &str {
        match self {
            Self::Modality(r) => &r.meaning,
            Self::Combined(r) => &r.meaning,
        }
    }
}

/// 一次引擎 tick 的完整输出
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FusionOutput {
    /// Unix 时间戳 (秒)
    pub timestamp: f64,
    pub primary_type: PrimaryType,
    pub primary_result: PrimaryResult,
    pub response_text: String,
    pub gesture_result: ModalityResult,
    pub gaze_result: ModalityResult,
    pub emotion_result: ModalityResult,
    pub combined_result: CombinedResult,
}
