//! 融合引擎
//!
//! 持有三个模态缓冲区，每次 tick 依次执行：
//! 1. 推入三模态特征向量 → 缓冲区追加并裁剪
//! 2. 每个模态走学习路径 (分类器) 或启发式路径
//! 3. 融合三个单模态结果
//! 4. 选出主结果 → 生成解读文本

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::buffer::{FeatureVector, ModalityBuffer};
use crate::config::{ClassifierPaths, EngineConfig};
use crate::utils::time;
use super::classifier::{classify_window, ClassifierAdapter, ClassifierSlot, LabelMap};
use super::composer::ResponseComposer;
use super::fusion::FusionUnit;
use super::modality::{Modality, ModalityState, PerModality};
use super::result::{FusionOutput, ModalityResult, PrimaryType};
use super::scorer::HeuristicScorer;
use super::selector::select_primary;

// ============================================================
// 引擎事件
// ============================================================

/// 引擎事件
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// 模态状态迁移
    StateChanged {
        modality: Modality,
        from: ModalityState,
        to: ModalityState,
    },
    /// 分类器失败，已回退到启发式
    ClassifierFallback {
        modality: Modality,
        reason: String,
    },
    /// 本次 tick 的主结果
    PrimarySelected {
        primary_type: PrimaryType,
        confidence: f32,
    },
    /// 缓冲区已清空
    BuffersCleared,
}

/// 引擎统计
#[derive(Debug, Clone, PartialEq)]
pub struct EngineStats {
    pub ticks: u64,
    pub buffer_lengths: PerModality<usize>,
    pub states: PerModality<ModalityState>,
    /// 已注册分类器的模态
    pub learned_modalities: Vec<Modality>,
}

/// 按配置路径加载各模态分类器 (失败不致命)
pub fn load_classifiers(paths: &ClassifierPaths) -> PerModality<ClassifierSlot> {
    let paths = PerModality {
        gesture: paths.gesture.as_deref(),
        gaze: paths.gaze.as_deref(),
        emotion: paths.emotion.as_deref(),
    };
    paths.map(|modality, path| match path {
        Some(path) => ClassifierSlot::load_linear(modality, path),
        None => ClassifierSlot::Absent,
    })
}

// ============================================================
// 融合引擎
// ============================================================

/// 时序多模态融合引擎
///
/// 每个会话一个实例；`process` 与 `clear_buffers` 需串行调用。
pub struct FusionEngine {
    config: EngineConfig,
    buffers: PerModality<ModalityBuffer>,
    classifiers: PerModality<ClassifierSlot>,
    label_map: Arc<LabelMap>,
    states: PerModality<ModalityState>,
    scorer: HeuristicScorer,
    fusion: FusionUnit,
    composer: ResponseComposer,
    /// 事件发送器
    event_tx: Option<mpsc::UnboundedSender<EngineEvent>>,
    ticks: u64,
}

impl FusionEngine {
    /// 按配置创建引擎，加载配置中的标签表和分类器
    pub fn new(config: EngineConfig) -> Self {
        let classifiers = load_classifiers(&config.classifiers);
        let label_map = Arc::new(LabelMap::load_or_default(config.label_map.as_deref()));
        Self::from_parts(config, classifiers, label_map)
    }

    /// 用已加载 (可共享) 的分类器和标签表创建引擎
    pub fn from_parts(
        config: EngineConfig,
        classifiers: PerModality<ClassifierSlot>,
        label_map: Arc<LabelMap>,
    ) -> Self {
        info!(
            "引擎初始化: max_history={}, 分类器={:?}",
            config.max_history, classifiers
        );

        let mut engine = Self {
            buffers: PerModality::from_fn(|_| ModalityBuffer::new(config.max_history)),
            classifiers,
            label_map,
            states: PerModality::default(),
            scorer: HeuristicScorer::new(config.min_frames),
            fusion: FusionUnit::new(config.fusion.clone(), config.max_confidence),
            composer: ResponseComposer::new(config.composer.clone()),
            event_tx: None,
            ticks: 0,
            config,
        };
        for modality in engine.missing_classifiers() {
            warn!("{} 未注册学习分类器，使用启发式评分", modality);
        }
        engine.refresh_states();
        engine
    }

    /// 注册分类器
    pub fn with_classifier(mut self, modality: Modality, adapter: Arc<dyn ClassifierAdapter>) -> Self {
        self.set_classifier(modality, ClassifierSlot::present(adapter));
        self
    }

    /// 设置事件通道
    pub fn with_event_channel(mut self, tx: mpsc::UnboundedSender<EngineEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    /// 替换某模态的分类器槽位
    pub fn set_classifier(&mut self, modality: Modality, slot: ClassifierSlot) {
        *self.classifiers.get_mut(modality) = slot;
        self.refresh_states();
    }

    /// 处理一个 tick
    ///
    /// 唯一的状态变更入口；不会失败，最差输出为 unknown / unclear
    pub fn process(
        &mut self,
        gesture: FeatureVector,
        gaze: FeatureVector,
        emotion: FeatureVector,
    ) -> FusionOutput {
        self.ticks += 1;

        for (modality, vector) in Modality::ALL.into_iter().zip([gesture, gaze, emotion]) {
            if vector.len() != modality.expected_arity() {
                debug!(
                    "{} 特征维度 {} 与约定 {} 不符，按较短长度比较",
                    modality,
                    vector.len(),
                    modality.expected_arity()
                );
            }
            self.buffers.get_mut(modality).push(vector);
        }
        self.refresh_states();

        let results = PerModality::from_fn(|m| self.interpret(m));
        let combined = self.fusion.fuse(&results.gesture, &results.gaze, &results.emotion);

        let (primary_type, primary_result) =
            select_primary(&results.gesture, &results.gaze, &results.emotion, &combined);
        let response_text = self.composer.compose(primary_type, &primary_result, &combined);
        debug!(
            "主结果: {} / {} ({:.2})",
            primary_type.as_str(),
            primary_result.pattern(),
            primary_result.confidence()
        );

        self.emit(EngineEvent::PrimarySelected {
            primary_type,
            confidence: primary_result.confidence(),
        });

        FusionOutput {
            timestamp: time::now(),
            primary_type,
            primary_result,
            response_text,
            gesture_result: results.gesture,
            gaze_result: results.gaze,
            emotion_result: results.emotion,
            combined_result: combined,
        }
    }

    /// 清空全部缓冲区，所有模态回到 Cold
    pub fn clear_buffers(&mut self) {
        for modality in Modality::ALL {
            self.buffers.get_mut(modality).clear();
        }
        self.states = PerModality::default();
        self.emit(EngineEvent::BuffersCleared);
    }

    /// 单模态解读：学习路径优先，失败或不适用时回退启发式
    fn interpret(&self, modality: Modality) -> ModalityResult {
        let buffer = self.buffers.get(modality);
        let window = self.config.classifier_window;

        if let Some(adapter) = self.classifiers.get(modality).adapter() {
            if buffer.len() >= window {
                match classify_window(
                    modality,
                    adapter,
                    buffer,
                    window,
                    &self.label_map,
                    self.config.max_confidence,
                ) {
                    Ok(result) => return result,
                    Err(e) => {
                        warn!("{} 分类器 {} 推断失败，回退到启发式评分: {}", modality, adapter.name(), e);
                        self.emit(EngineEvent::ClassifierFallback {
                            modality,
                            reason: e.to_string(),
                        });
                    }
                }
            }
        }

        let mut result = self.scorer.score(modality, buffer);
        result.confidence = result.confidence.min(self.config.max_confidence);
        result
    }

    fn state_for(&self, modality: Modality) -> ModalityState {
        let len = self.buffers.get(modality).len();
        if len < self.config.min_frames {
            ModalityState::Cold
        } else if len >= self.config.classifier_window && self.classifiers.get(modality).is_present() {
            ModalityState::Trained
        } else {
            ModalityState::Warm
        }
    }

    fn refresh_states(&mut self) {
        for modality in Modality::ALL {
            let to = self.state_for(modality);
            let from = std::mem::replace(self.states.get_mut(modality), to);
            if from != to {
                debug!("{} 状态: {:?} -> {:?}", modality, from, to);
                self.emit(EngineEvent::StateChanged { modality, from, to });
            }
        }
    }

    /// 当前模态状态
    pub fn state(&self, modality: Modality) -> ModalityState {
        *self.states.get(modality)
    }

    /// 某模态缓冲区帧数
    pub fn buffer_len(&self, modality: Modality) -> usize {
        self.buffers.get(modality).len()
    }

    pub fn buffer_lengths(&self) -> PerModality<usize> {
        self.buffers.map(|_, b| b.len())
    }

    /// 某模态缓冲区 (只读)
    pub fn buffer(&self, modality: Modality) -> &ModalityBuffer {
        self.buffers.get(modality)
    }

    pub fn has_classifier(&self, modality: Modality) -> bool {
        self.classifiers.get(modality).is_present()
    }

    /// 未注册分类器的模态
    pub fn missing_classifiers(&self) -> Vec<Modality> {
        Modality::ALL
            .into_iter()
            .filter(|m| !self.has_classifier(*m))
            .collect()
    }

    /// 获取统计信息
    pub fn stats(&self) -> EngineStats {
        EngineStats {
            ticks: self.ticks,
            buffer_lengths: self.buffer_lengths(),
            states: self.states.clone(),
            learned_modalities: Modality::ALL
                .into_iter()
                .filter(|m| self.has_classifier(*m))
                .collect(),
        }
    }

    fn emit(&self, event: EngineEvent) {
        if let Some(tx) = &self.event_tx {
            let _ = tx.send(event);
        }
    }
}

impl Default for FusionEngine {
    fn default() -> Self {
        Self::from_parts(
            EngineConfig::default(),
            PerModality::default(),
            Arc::new(LabelMap::builtin()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::classifier::{ClassifierError, Prediction};
    use crate::core::composer::NO_CLEAR_PATTERN;
    use crate::core::result::{InferenceSource, PrimaryResult};
    use ndarray::ArrayView2;

    struct FixedClassifier {
        label: &'static str,
        confidence: f32,
    }

    impl ClassifierAdapter for FixedClassifier {
        fn classify(&self, window: ArrayView2<'_, f32>) -> Result<Prediction, ClassifierError> {
            assert_eq!(window.nrows(), 10);
            Ok(Prediction { label: self.label.to_string(), confidence: self.confidence })
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    struct BrokenClassifier;

    impl ClassifierAdapter for BrokenClassifier {
        fn classify(&self, _window: ArrayView2<'_, f32>) -> Result<Prediction, ClassifierError> {
            Err(ClassifierError::Inference("weights corrupted".into()))
        }
    }

    fn steady_tick(engine: &mut FusionEngine) -> FusionOutput {
        engine.process(
            vec![0.5, 0.5, 0.0, 0.0],
            vec![0.5, 0.5, 3.0],
            vec![0.5, 0.5, 0.5, 0.5, 0.3],
        )
    }

    /// 确定性的变化输入
    fn wobbly_tick(engine: &mut FusionEngine, i: usize) -> FusionOutput {
        let t = i as f32;
        engine.process(
            vec![(t * 0.7).sin().abs() * 2.0, (t * 1.3).cos().abs(), t % 3.0, 0.1 * t],
            vec![(t * 0.4).sin() + 1.0, 0.2, (t * 0.9).cos().abs()],
            vec![(t * 0.3).sin().abs(), 0.2, (t * 0.5).cos().abs(), 0.1, 0.4],
        )
    }

    fn all_confidences(out: &FusionOutput) -> [f32; 5] {
        [
            out.gesture_result.confidence,
            out.gaze_result.confidence,
            out.emotion_result.confidence,
            out.combined_result.confidence,
            out.primary_result.confidence(),
        ]
    }

    #[test]
    fn test_end_to_end_steady_signal() {
        let mut engine = FusionEngine::default();
        steady_tick(&mut engine);
        steady_tick(&mut engine);
        let out = steady_tick(&mut engine);

        assert!((out.gesture_result.confidence - 0.95).abs() < 1e-6);
        assert!((out.gaze_result.confidence - 0.90).abs() < 1e-6);
        assert!((out.emotion_result.confidence - 0.75).abs() < 1e-6);

        // 0.35*0.95 + 0.25*0.90 + 0.40*0.75 + 0.10
        let combined = &out.combined_result;
        assert_ne!(combined.pattern, "unclear");
        assert!((combined.confidence - 0.9575).abs() < 1e-5);
        assert_eq!(combined.contributing.len(), 3);

        assert_eq!(out.primary_type, PrimaryType::Combined);
        assert_eq!(out.primary_result, PrimaryResult::Combined(combined.clone()));
        assert!(out.response_text.starts_with("I clearly observe "));
        assert!(out.response_text.contains(&combined.meaning));
        assert!(!out.response_text.contains("Overall"));
    }

    #[test]
    fn test_cold_start_and_gate() {
        let mut engine = FusionEngine::default();

        for expected_len in 1..=2 {
            let out = wobbly_tick(&mut engine, expected_len * 7);
            for r in [&out.gesture_result, &out.gaze_result, &out.emotion_result] {
                assert_eq!(r.pattern, "unknown");
                assert_eq!(r.confidence, 0.0);
                assert_eq!(r.duration_frames, expected_len);
            }
            assert_eq!(out.combined_result.pattern, "unclear");
            assert_eq!(out.combined_result.confidence, 0.0);
            assert_eq!(out.primary_type, PrimaryType::Combined);
            assert_eq!(out.response_text, NO_CLEAR_PATTERN);
            assert_eq!(engine.state(Modality::Gesture), ModalityState::Cold);
        }

        wobbly_tick(&mut engine, 3);
        assert_eq!(engine.state(Modality::Emotion), ModalityState::Warm);
    }

    #[test]
    fn test_buffer_bound_and_fifo() {
        let mut engine = FusionEngine::default();

        for i in 0..75 {
            engine.process(vec![i as f32, 0.0, 0.0, 0.0], vec![0.0; 3], vec![0.0; 5]);
            for (_, len) in engine.buffer_lengths().iter() {
                assert!(*len <= 30);
            }
        }

        let kept: Vec<f32> = engine.buffer(Modality::Gesture).iter().map(|v| v[0]).collect();
        let expected: Vec<f32> = (45..75).map(|i| i as f32).collect();
        assert_eq!(kept, expected);
        assert_eq!(engine.stats().ticks, 75);
    }

    #[test]
    fn test_confidence_bounds() {
        let mut engine = FusionEngine::default();

        for i in 0..60 {
            let out = wobbly_tick(&mut engine, i);
            for c in all_confidences(&out) {
                assert!((0.0..=0.98).contains(&c), "confidence {} out of range", c);
            }
            assert!(out.gesture_result.confidence <= 0.95);
            assert!(out.gaze_result.confidence <= 0.90);
        }
    }

    #[test]
    fn test_no_classifier_stays_heuristic() {
        let mut engine = FusionEngine::default();

        let mut outputs = Vec::new();
        for i in 0..12 {
            outputs.push(wobbly_tick(&mut engine, i));
        }

        let early = &outputs[4].gesture_result;
        let late = &outputs[11].gesture_result;
        assert_eq!(late.extra.source, InferenceSource::Heuristic);
        assert_eq!(early.extra.source, late.extra.source);
        assert!(late.extra.intent.is_none());
        assert_eq!(late.duration_frames, 12);
        assert_eq!(engine.state(Modality::Gesture), ModalityState::Warm);
        assert!(engine.stats().learned_modalities.is_empty());
    }

    #[test]
    fn test_learned_path_after_window() {
        let classifier = Arc::new(FixedClassifier { label: "thirsty", confidence: 0.999 });
        let mut engine = FusionEngine::default().with_classifier(Modality::Gesture, classifier);

        for i in 0..9 {
            let out = wobbly_tick(&mut engine, i);
            assert_ne!(out.gesture_result.extra.source, InferenceSource::Learned);
        }
        assert_eq!(engine.state(Modality::Gesture), ModalityState::Warm);

        let out = wobbly_tick(&mut engine, 9);
        assert_eq!(engine.state(Modality::Gesture), ModalityState::Trained);
        assert_eq!(engine.state(Modality::Gaze), ModalityState::Warm);

        let g = &out.gesture_result;
        assert_eq!(g.extra.source, InferenceSource::Learned);
        assert_eq!(g.pattern, "thirsty");
        assert_eq!(g.meaning, "I would like something to drink");
        assert_eq!(g.extra.intent.as_deref(), Some("request_drink"));
        // 截断到全局上限
        assert!((g.confidence - 0.98).abs() < 1e-6);
        assert_eq!(engine.stats().learned_modalities, vec![Modality::Gesture]);
        assert_eq!(engine.missing_classifiers(), vec![Modality::Gaze, Modality::Emotion]);
    }

    #[test]
    fn test_missing_classifiers_without_registration() {
        let engine = FusionEngine::default();
        assert_eq!(engine.missing_classifiers(), Modality::ALL.to_vec());

        let paths = ClassifierPaths {
            gaze: Some("/nonexistent/gaze.json".into()),
            ..Default::default()
        };
        let slots = load_classifiers(&paths);
        assert!(!slots.gaze.is_present());
    }

    #[test]
    fn test_broken_classifier_falls_back() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut engine = FusionEngine::default()
            .with_classifier(Modality::Emotion, Arc::new(BrokenClassifier))
            .with_event_channel(tx);

        let mut last = None;
        for i in 0..10 {
            last = Some(wobbly_tick(&mut engine, i));
        }
        let out = last.unwrap();
        assert_eq!(out.emotion_result.extra.source, InferenceSource::Heuristic);
        assert!(out.emotion_result.confidence > 0.0);

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }

        assert!(events.iter().any(|e| matches!(
            e,
            EngineEvent::ClassifierFallback { modality: Modality::Emotion, .. }
        )));
        assert!(events.contains(&EngineEvent::StateChanged {
            modality: Modality::Emotion,
            from: ModalityState::Warm,
            to: ModalityState::Trained,
        }));
        let selections = events
            .iter()
            .filter(|e| matches!(e, EngineEvent::PrimarySelected { .. }))
            .count();
        assert_eq!(selections, 10);
    }

    #[test]
    fn test_clear_buffers_idempotent() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut engine = FusionEngine::default().with_event_channel(tx);

        engine.clear_buffers();
        engine.clear_buffers();
        assert_eq!(engine.buffer_lengths(), PerModality { gesture: 0, gaze: 0, emotion: 0 });

        for i in 0..5 {
            wobbly_tick(&mut engine, i);
        }
        assert_eq!(engine.state(Modality::Gaze), ModalityState::Warm);

        engine.clear_buffers();
        engine.clear_buffers();
        for modality in Modality::ALL {
            assert_eq!(engine.buffer_len(modality), 0);
            assert_eq!(engine.state(modality), ModalityState::Cold);
        }

        let cleared = std::iter::from_fn(|| rx.try_recv().ok())
            .filter(|e| *e == EngineEvent::BuffersCleared)
            .count();
        assert_eq!(cleared, 4);

        // 清空后重新冷启动
        let out = wobbly_tick(&mut engine, 1);
        assert_eq!(out.gesture_result.pattern, "unknown");
    }

    #[test]
    fn test_arity_mismatch_is_tolerated() {
        let mut engine = FusionEngine::default();
        for i in 0..4 {
            let gesture = if i % 2 == 0 { vec![0.5, 0.5] } else { vec![0.5, 0.5, 0.1, 0.2, 0.9] };
            let out = engine.process(gesture, vec![0.4], vec![0.2, 0.3]);
            if i >= 2 {
                assert!((out.gesture_result.confidence - 0.95).abs() < 1e-6);
                assert_eq!(out.gaze_result.extra.blink_rate, Some(12.0));
                assert!(out.emotion_result.extra.dominant_emotion.is_none());
            }
        }
    }
}
