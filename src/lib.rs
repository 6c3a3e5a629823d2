//! 时序多模态非语言融合引擎
//!
//! 核心流程：
//! - 每个 tick 推入手势 / 注视 / 表情三路特征向量
//! - 各模态滚动窗口 → 启发式评分或学习型分类器
//! - 加权融合 → 选出主结果 → 生成带置信修饰的自然语言解读

pub mod buffer;
pub mod config;
pub mod core;
pub mod error;
pub mod utils;

// Re-exports - 核心引擎
pub use crate::core::engine::{EngineEvent, EngineStats, FusionEngine};
pub use crate::core::session::SessionPool;
pub use crate::core::modality::{Modality, ModalityState, PerModality};

// Re-exports - 结果
pub use crate::core::result::{
    CombinedResult, Contribution, FusionOutput, InferenceSource, ModalityExtra,
    ModalityResult, PrimaryResult, PrimaryType,
};

// Re-exports - 组件
pub use crate::core::catalog::{PatternCatalog, PatternEntry};
pub use crate::core::scorer::HeuristicScorer;
pub use crate::core::classifier::{
    ClassifierAdapter, ClassifierError, ClassifierSlot, LabelEntry, LabelMap,
    LinearClassifier, LinearClassifierWeights, Prediction,
};
pub use crate::core::fusion::FusionUnit;
pub use crate::core::selector::select_primary;
pub use crate::core::composer::{ResponseComposer, NO_CLEAR_PATTERN};

// Re-exports - 缓冲区 / 配置
pub use buffer::{FeatureVector, ModalityBuffer};
pub use config::{ClassifierPaths, ComposerConfig, EngineConfig, FusionConfig};
pub use error::FusionError;
