//! 多模态融合单元

use tracing::debug;

use crate::config::FusionConfig;
use super::catalog::PatternCatalog;
use super::result::{CombinedResult, Contribution, ModalityResult};
use super::scorer::fingerprint_labels;

/// 多模态融合
#[derive(Debug, Clone)]
pub struct FusionUnit {
    config: FusionConfig,
    /// 输出置信度上限
    max_confidence: f32,
}

impl FusionUnit {
    pub fn new(config: FusionConfig, max_confidence: f32) -> Self {
        Self { config, max_confidence }
    }

    /// 融合同一 tick 的三个单模态结果
    pub fn fuse(
        &self,
        gesture: &ModalityResult,
        gaze: &ModalityResult,
        emotion: &ModalityResult,
    ) -> CombinedResult {
        let c = &self.config;

        // 硬门限：任一输入不足则不融合
        if gesture.confidence < c.gate || gaze.confidence < c.gate || emotion.confidence < c.gate {
            return CombinedResult::unclear();
        }

        let entry = PatternCatalog::combined().pick(fingerprint_labels(&[
            gesture.pattern.as_str(),
            gaze.pattern.as_str(),
            emotion.pattern.as_str(),
        ]));

        let mut confidence = c.gesture_weight * gesture.confidence
            + c.gaze_weight * gaze.confidence
            + c.emotion_weight * emotion.confidence;

        let boosted = gesture.confidence > c.gesture_boost_threshold
            && gaze.confidence > c.gaze_boost_threshold
            && emotion.confidence > c.emotion_boost_threshold;
        if boosted {
            confidence += c.boost;
        }
        let confidence = confidence.clamp(0.0, self.max_confidence);

        debug!(
            "融合: {} + {} + {} -> {} ({:.3}{})",
            gesture.pattern,
            gaze.pattern,
            emotion.pattern,
            entry.name,
            confidence,
            if boosted { ", boosted" } else { "" }
        );

        CombinedResult {
            pattern: entry.name.to_string(),
            confidence,
            meaning: entry.meaning.to_string(),
            description: entry.description.to_string(),
            contributing: [gesture, gaze, emotion]
                .iter()
                .map(|r| Contribution { modality: r.modality, pattern: r.pattern.clone() })
                .collect(),
        }
    }
}

impl Default for FusionUnit {
    fn default() -> Self {
        Self::new(FusionConfig::default(), 0.98)
    }
}
