//! 模态定义

use serde::{Deserialize, Serialize};

/// 非语言输入通道
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    /// 手势: [x, y, angle, velocity]
    Gesture,
    /// 注视: [gaze_x, gaze_y, blink_rate]
    Gaze,
    /// 表情: [happy, sad, angry, surprised, neutral]
    Emotion,
}

impl Modality {
    /// 固定迭代顺序
    pub const ALL: [Modality; 3] = [Self::Gesture, Self::Gaze, Self::Emotion];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gesture => "gesture",
            Self::Gaze => "gaze",
            Self::Emotion => "emotion",
        }
    }

    /// 约定的特征维度 (不强制)
    pub fn expected_arity(&self) -> usize {
        match self {
            Self::Gesture => 4,
            Self::Gaze => 3,
            Self::Emotion => 5,
        }
    }
}

impl std::fmt::Display for Modality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 单模态推断状态
///
/// 各模态随缓冲区增长独立迁移，`clear_buffers` 立即回到 Cold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModalityState {
    /// 帧数不足，输出 unknown
    #[default]
    Cold,
    /// 启发式评分
    Warm,
    /// 已注册分类器且窗口已满
    Trained,
}

/// 每个模态一份的容器
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PerModality<T> {
    pub gesture: T,
    pub gaze: T,
    pub emotion: T,
}

impl<T> PerModality<T> {
    pub fn from_fn(mut f: impl FnMut(Modality) -> T) -> Self {
        Self {
            gesture: f(Modality::Gesture),
            gaze: f(Modality::Gaze),
            emotion: f(Modality::Emotion),
        }
    }

    pub fn get(&self, modality: Modality) -> &T {
        match modality {
            Modality::Gesture => &self.gesture,
            Modality::Gaze => &self.gaze,
            Modality::Emotion => &self.emotion,
        }
    }

    pub fn get_mut(&mut self, modality: Modality) -> &mut T {
        match modality {
            Modality::Gesture => &mut self.gesture,
            Modality::Gaze => &mut self.gaze,
            Modality::Emotion => &mut self.emotion,
        }
    }

    pub fn map<U>(&self, mut f: impl FnMut(Modality, &T) -> U) -> PerModality<U> {
        PerModality::from_fn(|m| f(m, self.get(m)))
    }

    /// 按 gesture → gaze → emotion 顺序迭代
    pub fn iter(&self) -> impl Iterator<Item = (Modality, &T)> + '_ {
        Modality::ALL.into_iter().map(move |m| (m, self.get(m)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_modality_access() {
        let mut lens = PerModality::from_fn(|m| m.expected_arity());
        assert_eq!(*lens.get(Modality::Gaze), 3);

        *lens.get_mut(Modality::Emotion) = 7;
        let order: Vec<_> = lens.iter().map(|(m, v)| (m.as_str(), *v)).collect();
        assert_eq!(order, vec![("gesture", 4), ("gaze", 3), ("emotion", 7)]);

        let doubled = lens.map(|_, v| v * 2);
        assert_eq!(doubled.gesture, 8);
    }

    #[test]
    fn test_modality_serde_names() {
        let json = serde_json::to_string(&Modality::Gaze).unwrap();
        assert_eq!(json, "\"gaze\"");
        assert_eq!(ModalityState::default(), ModalityState::Cold);
    }
}
