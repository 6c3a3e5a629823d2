//! 学习型分类器适配
//!
//! 分类器是可插拔能力：给定某模态最近 N 帧 (帧 × 特征矩阵)，返回标签和 [0,1] 置信度。
//! 引擎只依赖 `ClassifierAdapter` 接口，不关心其内部实现。
//! 适配器缺失和推断失败在引擎中按同一方式处理：回退到启发式评分。

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use ndarray::{Array1, Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::buffer::ModalityBuffer;
use super::modality::Modality;
use super::result::{InferenceSource, ModalityExtra, ModalityResult};

// ============================================================
// 适配器接口
// ============================================================

/// 分类器错误
#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("failed to read classifier artifact: {0}")]
    Load(#[from] std::io::Error),
    #[error("malformed classifier artifact: {0}")]
    Malformed(String),
    #[error("window shape mismatch: expected {expected} features, got {actual}")]
    Shape { expected: usize, actual: usize },
    #[error("inference failed: {0}")]
    Inference(String),
    #[error("window needs {0} frames")]
    EmptyWindow(usize),
}

impl From<serde_json::Error> for ClassifierError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}

/// 分类预测
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label: String,
    pub confidence: f32,
}

/// 分类器适配接口
///
/// 可在多个会话间共享，因此要求 `Send + Sync` 且推断只读
pub trait ClassifierAdapter: Send + Sync {
    /// 对窗口 (行 = 帧，按时间顺序) 分类
    fn classify(&self, window: ArrayView2<'_, f32>) -> Result<Prediction, ClassifierError>;

    fn name(&self) -> &str {
        "classifier"
    }
}

/// 每个模态的分类器槽位
#[derive(Clone, Default)]
pub enum ClassifierSlot {
    #[default]
    Absent,
    Present(Arc<dyn ClassifierAdapter>),
}

impl ClassifierSlot {
    pub fn present(adapter: Arc<dyn ClassifierAdapter>) -> Self {
        Self::Present(adapter)
    }

    /// 从权重文件加载线性分类器，失败时记录警告并保持 Absent
    pub fn load_linear(modality: Modality, path: &Path) -> Self {
        match LinearClassifier::from_json_file(path) {
            Ok(classifier) => {
                info!(
                    "{} 分类器已加载: {} ({} 个标签)",
                    modality,
                    path.display(),
                    classifier.labels().len()
                );
                Self::Present(Arc::new(classifier))
            }
            Err(e) => {
                warn!("{} 分类器加载失败，使用启发式评分: {} ({})", modality, path.display(), e);
                Self::Absent
            }
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    pub fn adapter(&self) -> Option<&dyn ClassifierAdapter> {
        match self {
            Self::Present(adapter) => Some(adapter.as_ref()),
            Self::Absent => None,
        }
    }
}

impl fmt::Debug for ClassifierSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => f.write_str("Absent"),
            Self::Present(adapter) => write!(f, "Present({})", adapter.name()),
        }
    }
}

// ============================================================
// 标签表
// ============================================================

/// 标签对应的意图和消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEntry {
    pub intent: String,
    pub message: String,
}

/// 标签 → {intent, message} 静态查找表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelMap {
    entries: HashMap<String, LabelEntry>,
}

impl LabelMap {
    /// 内置默认表 (照护场景常用表达)
    pub fn builtin() -> Self {
        let defaults = [
            ("yes", "affirm", "yes, I agree"),
            ("no", "deny", "no, I do not want that"),
            ("help", "request_help", "I need help"),
            ("pain", "report_pain", "I am in pain"),
            ("thirsty", "request_drink", "I would like something to drink"),
            ("hungry", "request_food", "I would like something to eat"),
            ("tired", "request_rest", "I am tired and want to rest"),
            ("bathroom", "request_bathroom", "I need to use the bathroom"),
            ("cold", "report_cold", "I feel cold"),
            ("hot", "report_hot", "I feel too warm"),
        ];

        let entries = defaults
            .into_iter()
            .map(|(label, intent, message)| {
                (
                    label.to_string(),
                    LabelEntry { intent: intent.to_string(), message: message.to_string() },
                )
            })
            .collect();

        Self { entries }
    }

    pub fn from_json_str(json: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: &Path) -> crate::error::Result<Self> {
        let txt = std::fs::read_to_string(path)?;
        Self::from_json_str(&txt)
    }

    /// 有路径则尝试加载，失败或无路径时使用内置表
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::builtin();
        };

        match Self::from_json_file(path) {
            Ok(map) => map,
            Err(e) => {
                warn!("标签表加载失败，使用内置默认: {} ({})", path.display(), e);
                Self::builtin()
            }
        }
    }

    /// 查找标签；未知标签按原样作为消息
    pub fn lookup(&self, label: &str) -> LabelEntry {
        self.entries.get(label).cloned().unwrap_or_else(|| LabelEntry {
            intent: "unknown".to_string(),
            message: label.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for LabelMap {
    fn default() -> Self {
        Self::builtin()
    }
}

// ============================================================
// 线性分类器
// ============================================================

/// 线性分类器权重文件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearClassifierWeights {
    pub labels: Vec<String>,
    /// 标签数 × 特征数
    pub weights: Vec<Vec<f32>>,
    pub bias: Vec<f32>,
}

/// 线性 + softmax 分类器
///
/// 按帧对窗口做均值池化后线性映射
#[derive(Debug, Clone)]
pub struct LinearClassifier {
    labels: Vec<String>,
    weights: Array2<f32>,
    bias: Array1<f32>,
}

impl LinearClassifier {
    pub fn from_weights(w: LinearClassifierWeights) -> Result<Self, ClassifierError> {
        let rows = w.labels.len();
        if rows == 0 {
            return Err(ClassifierError::Malformed("no labels".into()));
        }
        if w.weights.len() != rows || w.bias.len() != rows {
            return Err(ClassifierError::Malformed(format!(
                "{} labels but {} weight rows and {} biases",
                rows,
                w.weights.len(),
                w.bias.len()
            )));
        }

        let cols = w.weights[0].len();
        if cols == 0 || w.weights.iter().any(|r| r.len() != cols) {
            return Err(ClassifierError::Malformed("ragged or empty weight rows".into()));
        }

        let flat: Vec<f32> = w.weights.into_iter().flatten().collect();
        let weights = Array2::from_shape_vec((rows, cols), flat)
            .map_err(|e| ClassifierError::Malformed(e.to_string()))?;

        Ok(Self {
            labels: w.labels,
            weights,
            bias: Array1::from_vec(w.bias),
        })
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ClassifierError> {
        let txt = std::fs::read_to_string(path)?;
        Self::from_weights(serde_json::from_str(&txt)?)
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn feature_dim(&self) -> usize {
        self.weights.ncols()
    }
}

impl ClassifierAdapter for LinearClassifier {
    fn classify(&self, window: ArrayView2<'_, f32>) -> Result<Prediction, ClassifierError> {
        let pooled = window
            .mean_axis(Axis(0))
            .ok_or(ClassifierError::EmptyWindow(1))?;

        if pooled.len() != self.feature_dim() {
            return Err(ClassifierError::Shape {
                expected: self.feature_dim(),
                actual: pooled.len(),
            });
        }

        let logits = self.weights.dot(&pooled) + &self.bias;
        let max = logits.fold(f32::NEG_INFINITY, |m, v| m.max(*v));
        let exp = logits.mapv(|v| (v - max).exp());
        let total = exp.sum();
        if !total.is_finite() || total <= 0.0 {
            return Err(ClassifierError::Inference("softmax overflow".into()));
        }

        let (best, best_exp) = exp
            .iter()
            .enumerate()
            .fold((0, f32::NEG_INFINITY), |acc, (i, v)| if *v > acc.1 { (i, *v) } else { acc });

        Ok(Prediction {
            label: self.labels[best].clone(),
            confidence: best_exp / total,
        })
    }

    fn name(&self) -> &str {
        "linear"
    }
}

// ============================================================
// 学习路径
// ============================================================

/// 用分类器解读最近 `window_len` 帧
///
/// 置信度截断到 [0, max_confidence]；非有限值视为推断失败
pub fn classify_window(
    modality: Modality,
    adapter: &dyn ClassifierAdapter,
    buffer: &ModalityBuffer,
    window_len: usize,
    labels: &LabelMap,
    max_confidence: f32,
) -> Result<ModalityResult, ClassifierError> {
    let window = buffer
        .window_matrix(window_len)
        .ok_or(ClassifierError::EmptyWindow(window_len))?;

    let prediction = adapter.classify(window.view())?;
    if !prediction.confidence.is_finite() {
        return Err(ClassifierError::Inference(format!(
            "non-finite confidence for label {}",
            prediction.label
        )));
    }

    let entry = labels.lookup(&prediction.label);

    Ok(ModalityResult {
        modality,
        description: format!("the {} sign \"{}\"", modality, prediction.label),
        pattern: prediction.label,
        confidence: prediction.confidence.clamp(0.0, max_confidence),
        meaning: entry.message,
        duration_frames: buffer.len(),
        extra: ModalityExtra {
            source: InferenceSource::Learned,
            intent: Some(entry.intent),
            ..Default::default()
        },
    })
}
