//! 模式目录
//!
//! 每个模态一个封闭的模式枚举 (名称 → 描述 / 含义)，运行时只读

use super::modality::Modality;

/// 目录条目
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternEntry {
    pub name: &'static str,
    /// 可直接放入 "I ... observe {description}" 的名词短语
    pub description: &'static str,
    pub meaning: &'static str,
}

const fn entry(name: &'static str, description: &'static str, meaning: &'static str) -> PatternEntry {
    PatternEntry { name, description, meaning }
}

const GESTURE_PATTERNS: &[PatternEntry] = &[
    entry("wave", "a waving hand motion", "a greeting or an attempt to get attention"),
    entry("point", "a pointing gesture", "a wish to direct attention to something specific"),
    entry("nod", "a nodding motion", "agreement or acknowledgment"),
    entry("shake", "a head-shaking motion", "disagreement or refusal"),
    entry("circle", "a circular hand motion", "a request to repeat or continue something"),
];

const GAZE_PATTERNS: &[PatternEntry] = &[
    entry("fixation", "a steady, fixed gaze", "focused attention on one thing"),
    entry("scanning", "a gaze scanning the surroundings", "searching for something or someone"),
    entry("avoidance", "a gaze directed away", "discomfort or a wish for a break"),
    entry("rapid_blinking", "rapid blinking", "stress or fatigue"),
    entry("tracking", "eyes following a moving target", "interest in what is happening nearby"),
];

const EMOTION_PATTERNS: &[PatternEntry] = &[
    entry("joy", "a joyful expression", "contentment or happiness"),
    entry("distress", "a distressed expression", "discomfort or pain"),
    entry("frustration", "a frustrated expression", "difficulty getting a need across"),
    entry("surprise", "a surprised expression", "that something unexpected has happened"),
    entry("calm", "a calm expression", "a relaxed and settled state"),
];

const COMBINED_PATTERNS: &[PatternEntry] = &[
    entry(
        "agreement",
        "gesture, gaze and expression aligned in assent",
        "a clear yes or approval",
    ),
    entry(
        "disagreement",
        "gesture, gaze and expression aligned in refusal",
        "a clear no or objection",
    ),
    entry(
        "confusion",
        "mixed signals across the channels",
        "confusion or uncertainty about what is happening",
    ),
    entry(
        "interest",
        "engaged movement with attentive gaze",
        "interest and a wish to engage",
    ),
    entry(
        "disengagement",
        "withdrawn movement with an averted gaze",
        "tiredness or a wish to stop",
    ),
];

/// 表情主导标签 (按特征分量顺序)
pub const EMOTION_LABELS: [&str; 5] = ["happy", "sad", "angry", "surprised", "neutral"];

/// 模式目录
#[derive(Debug, Clone, Copy)]
pub struct PatternCatalog {
    entries: &'static [PatternEntry],
}

impl PatternCatalog {
    /// 单模态目录
    pub fn for_modality(modality: Modality) -> Self {
        let entries = match modality {
            Modality::Gesture => GESTURE_PATTERNS,
            Modality::Gaze => GAZE_PATTERNS,
            Modality::Emotion => EMOTION_PATTERNS,
        };
        Self { entries }
    }

    /// 多模态组合目录
    pub fn combined() -> Self {
        Self { entries: COMBINED_PATTERNS }
    }

    /// 用确定性哈希选择条目
    pub fn pick(&self, fingerprint: u64) -> &'static PatternEntry {
        let idx = (fingerprint % self.entries.len() as u64) as usize;
        &self.entries[idx]
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> {
        self.entries.iter().map(|e| e.name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_contents() {
        let gesture: Vec<_> = PatternCatalog::for_modality(Modality::Gesture).names().collect();
        assert_eq!(gesture, vec!["wave", "point", "nod", "shake", "circle"]);

        let combined: Vec<_> = PatternCatalog::combined().names().collect();
        assert_eq!(
            combined,
            vec!["agreement", "disagreement", "confusion", "interest", "disengagement"]
        );

        for m in Modality::ALL {
            assert_eq!(PatternCatalog::for_modality(m).len(), 5);
        }
    }

    #[test]
    fn test_pick_wraps() {
        let catalog = PatternCatalog::for_modality(Modality::Gaze);
        assert_eq!(catalog.pick(0).name, "fixation");
        assert_eq!(catalog.pick(6).name, "scanning");
    }
}
