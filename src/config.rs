//! 引擎配置
//!
//! 所有常数默认值即行为基线；可从 TOML 覆盖

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{FusionError, Result};

/// 融合单元配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    pub gesture_weight: f32,
    pub gaze_weight: f32,
    pub emotion_weight: f32,
    /// 任一模态低于此值则不融合
    pub gate: f32,
    pub gesture_boost_threshold: f32,
    pub gaze_boost_threshold: f32,
    pub emotion_boost_threshold: f32,
    /// 三模态均高置信时的加成
    pub boost: f32,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            gesture_weight: 0.35,
            gaze_weight: 0.25,
            emotion_weight: 0.40,
            gate: 0.2,
            gesture_boost_threshold: 0.7,
            gaze_boost_threshold: 0.6,
            emotion_boost_threshold: 0.7,
            boost: 0.10,
        }
    }
}

/// 响应生成配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposerConfig {
    /// 低于此值输出固定的 "未检测到" 句子
    pub min_confidence: f32,
    /// 高于此值用 "clearly"
    pub clearly: f32,
    /// 高于此值用 "likely"
    pub likely: f32,
    /// 组合结果高于此值时追加总体解读
    pub overall: f32,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.3,
            clearly: 0.8,
            likely: 0.6,
            overall: 0.6,
        }
    }
}

/// 各模态分类器权重文件
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierPaths {
    pub gesture: Option<PathBuf>,
    pub gaze: Option<PathBuf>,
    pub emotion: Option<PathBuf>,
}

/// 引擎配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// 每个模态缓冲区容量
    pub max_history: usize,
    /// 启发式评分所需最少帧数
    pub min_frames: usize,
    /// 分类器输入窗口长度
    pub classifier_window: usize,
    /// 所有输出置信度上限
    pub max_confidence: f32,
    pub fusion: FusionConfig,
    pub composer: ComposerConfig,
    /// 标签表 JSON (缺省用内置表)
    pub label_map: Option<PathBuf>,
    pub classifiers: ClassifierPaths,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_history: 30,
            min_frames: 3,
            classifier_window: 10,
            max_confidence: 0.98,
            fusion: FusionConfig::default(),
            composer: ComposerConfig::default(),
            label_map: None,
            classifiers: ClassifierPaths::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(txt: &str) -> Result<Self> {
        let config: Self = toml::from_str(txt)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let txt = std::fs::read_to_string(path)?;
        Self::from_toml_str(&txt)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_history == 0 {
            return Err(FusionError::Validation("max_history must be positive".into()));
        }
        if self.min_frames == 0 {
            return Err(FusionError::Validation("min_frames must be positive".into()));
        }
        if self.classifier_window == 0 || self.classifier_window > self.max_history {
            return Err(FusionError::Validation(format!(
                "classifier_window must be in 1..={}, got {}",
                self.max_history, self.classifier_window
            )));
        }

        let f = &self.fusion;
        if [f.gesture_weight, f.gaze_weight, f.emotion_weight, f.boost]
            .iter()
            .any(|w| !w.is_finite() || *w < 0.0)
        {
            return Err(FusionError::Validation("fusion weights must be non-negative".into()));
        }

        let c = &self.composer;
        let unit = [
            ("max_confidence", self.max_confidence),
            ("fusion.gate", f.gate),
            ("fusion.gesture_boost_threshold", f.gesture_boost_threshold),
            ("fusion.gaze_boost_threshold", f.gaze_boost_threshold),
            ("fusion.emotion_boost_threshold", f.emotion_boost_threshold),
            ("composer.min_confidence", c.min_confidence),
            ("composer.clearly", c.clearly),
            ("composer.likely", c.likely),
            ("composer.overall", c.overall),
        ];
        for (name, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(FusionError::Validation(format!("{} must be in [0,1], got {}", name, value)));
            }
        }

        Ok(())
    }
}
