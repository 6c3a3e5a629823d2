//! 响应生成
//!
//! 把主结果 (以及不同于主结果的组合结果) 转成一句自然语言解读

use crate::config::ComposerConfig;
use super::result::{CombinedResult, PrimaryResult, PrimaryType};

/// 低置信度时的固定回复
pub const NO_CLEAR_PATTERN: &str =
    "I'm not detecting a clear pattern in your nonverbal communication.";

/// 响应生成器
#[derive(Debug, Clone, Default)]
pub struct ResponseComposer {
    config: ComposerConfig,
}

impl ResponseComposer {
    pub fn new(config: ComposerConfig) -> Self {
        Self { config }
    }

    /// 置信度修饰词
    pub fn qualifier(&self, confidence: f32) -> &'static str {
        if confidence > self.config.clearly {
            "clearly"
        } else if confidence > self.config.likely {
            "likely"
        } else {
            "possibly"
        }
    }

    pub fn compose(
        &self,
        primary_type: PrimaryType,
        primary: &PrimaryResult,
        combined: &CombinedResult,
    ) -> String {
        let confidence = primary.confidence();
        if confidence < self.config.min_confidence {
            return NO_CLEAR_PATTERN.to_string();
        }

        let mut text = format!(
            "I {} observe {}. This suggests {}. ",
            self.qualifier(confidence),
            primary.description(),
            primary.meaning()
        );

        if primary_type != PrimaryType::Combined && combined.confidence > self.config.overall {
            text.push_str(&format!(
                "Overall, your nonverbal communication indicates {}.",
                combined.meaning
            ));
        }

        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::modality::Modality;
    use crate::core::result::ModalityResult;

    fn gesture(confidence: f32) -> PrimaryResult {
        PrimaryResult::Modality(ModalityResult {
            pattern: "wave".into(),
            confidence,
            meaning: "a greeting".into(),
            description: "a waving hand motion".into(),
            ..ModalityResult::unknown(Modality::Gesture, 5)
        })
    }

    fn combined(confidence: f32) -> CombinedResult {
        CombinedResult {
            pattern: "interest".into(),
            confidence,
            meaning: "interest and a wish to engage".into(),
            description: "engaged movement".into(),
            contributing: Vec::new(),
        }
    }

    #[test]
    fn test_threshold() {
        let composer = ResponseComposer::default();

        let text = composer.compose(PrimaryType::Gesture, &gesture(0.29), &combined(0.9));
        assert_eq!(text, NO_CLEAR_PATTERN);

        let text = composer.compose(PrimaryType::Gesture, &gesture(0.30), &combined(0.1));
        assert_eq!(
            text,
            "I possibly observe a waving hand motion. This suggests a greeting. "
        );
    }

    #[test]
    fn test_qualifiers() {
        let composer = ResponseComposer::default();
        assert_eq!(composer.qualifier(0.81), "clearly");
        assert_eq!(composer.qualifier(0.8), "likely");
        assert_eq!(composer.qualifier(0.61), "likely");
        assert_eq!(composer.qualifier(0.6), "possibly");
    }

    #[test]
    fn test_template_keeps_trailing_space() {
        let composer = ResponseComposer::default();
        let primary = PrimaryResult::Modality(ModalityResult {
            pattern: "wave".into(),
            confidence: 0.5,
            meaning: "m".into(),
            description: "d".into(),
            ..ModalityResult::unknown(Modality::Gesture, 5)
        });
        let text = composer.compose(PrimaryType::Gesture, &primary, &CombinedResult::unclear());
        assert_eq!(text, "I possibly observe d. This suggests m. ");
    }

    #[test]
    fn test_overall_suffix() {
        let composer = ResponseComposer::default();

        let text = composer.compose(PrimaryType::Gesture, &gesture(0.9), &combined(0.65));
        assert_eq!(
            text,
            "I clearly observe a waving hand motion. This suggests a greeting. \
             Overall, your nonverbal communication indicates interest and a wish to engage."
        );

        // combined 恰为 0.6 不追加
        let text = composer.compose(PrimaryType::Gesture, &gesture(0.9), &combined(0.6));
        assert!(!text.contains("Overall"));

        // 主结果就是 combined 时不追加
        let primary = PrimaryResult::Combined(combined(0.9));
        let text = composer.compose(PrimaryType::Combined, &primary, &combined(0.9));
        assert_eq!(
            text,
            "I clearly observe engaged movement. This suggests interest and a wish to engage. "
        );
    }
}
