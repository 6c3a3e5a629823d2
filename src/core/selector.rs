//! 主结果选择

use super::modality::Modality;
use super::result::{CombinedResult, ModalityResult, PrimaryResult, PrimaryType};

/// 选出置信度最高的结果
///
/// 默认 combined，只在严格大于当前最优时替换；
/// 比较顺序 gesture → gaze → emotion，因此与 combined 持平时 combined 胜出，
/// 单模态之间持平时先出现者胜出。
pub fn select_primary(
    gesture: &ModalityResult,
    gaze: &ModalityResult,
    emotion: &ModalityResult,
    combined: &CombinedResult,
) -> (PrimaryType, PrimaryResult) {
    let kind = primary_type_for([
        gesture.confidence,
        gaze.confidence,
        emotion.confidence,
        combined.confidence,
    ]);

    let result = match kind {
        PrimaryType::Gesture => PrimaryResult::Modality(gesture.clone()),
        PrimaryType::Gaze => PrimaryResult::Modality(gaze.clone()),
        PrimaryType::Emotion => PrimaryResult::Modality(emotion.clone()),
        PrimaryType::Combined => PrimaryResult::Combined(combined.clone()),
    };

    (kind, result)
}

/// 只按置信度选择类型 (gesture, gaze, emotion, combined)
pub fn primary_type_for(confidences: [f32; 4]) -> PrimaryType {
    let [g, e, m, c] = confidences;
    let mut best = (PrimaryType::Combined, c);
    for (modality, conf) in Modality::ALL.into_iter().zip([g, e, m]) {
        if conf > best.1 {
            best = (PrimaryType::from(modality), conf);
        }
    }
    best.0
}
