//! 会话池
//!
//! 每个对话 (患者) 一个独立引擎；分类器和标签表只读共享

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::info;
use uuid::Uuid;

use crate::buffer::FeatureVector;
use crate::config::EngineConfig;
use super::classifier::{ClassifierAdapter, ClassifierSlot, LabelMap};
use super::engine::{load_classifiers, EngineStats, FusionEngine};
use super::modality::{Modality, PerModality};
use super::result::FusionOutput;

/// 会话池
///
/// 同一会话的调用在引擎锁内串行；不同会话互不阻塞
pub struct SessionPool {
    config: EngineConfig,
    classifiers: PerModality<ClassifierSlot>,
    label_map: Arc<LabelMap>,
    sessions: RwLock<HashMap<Uuid, Arc<Mutex<FusionEngine>>>>,
}

impl SessionPool {
    /// 创建会话池，分类器和标签表只加载一次
    pub fn new(config: EngineConfig) -> Self {
        let classifiers = load_classifiers(&config.classifiers);
        let label_map = Arc::new(LabelMap::load_or_default(config.label_map.as_deref()));
        Self {
            config,
            classifiers,
            label_map,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// 为所有后续会话注册共享分类器
    pub fn with_classifier(mut self, modality: Modality, adapter: Arc<dyn ClassifierAdapter>) -> Self {
        *self.classifiers.get_mut(modality) = ClassifierSlot::present(adapter);
        self
    }

    /// 打开新会话
    pub fn open(&self) -> Uuid {
        let id = Uuid::new_v4();
        let engine = FusionEngine::from_parts(
            self.config.clone(),
            self.classifiers.clone(),
            Arc::clone(&self.label_map),
        );
        self.sessions.write().insert(id, Arc::new(Mutex::new(engine)));
        info!("会话已打开: {}", id);
        id
    }

    fn engine(&self, id: &Uuid) -> Option<Arc<Mutex<FusionEngine>>> {
        self.sessions.read().get(id).cloned()
    }

    /// 在指定会话上处理一个 tick；会话不存在时返回 None
    pub fn process(
        &self,
        id: &Uuid,
        gesture: FeatureVector,
        gaze: FeatureVector,
        emotion: FeatureVector,
    ) -> Option<FusionOutput> {
        let engine = self.engine(id)?;
        let output = engine.lock().process(gesture, gaze, emotion);
        Some(output)
    }

    /// 对话边界：清空会话上下文
    pub fn clear(&self, id: &Uuid) -> bool {
        match self.engine(id) {
            Some(engine) => {
                engine.lock().clear_buffers();
                true
            }
            None => false,
        }
    }

    pub fn stats(&self, id: &Uuid) -> Option<EngineStats> {
        self.engine(id).map(|engine| engine.lock().stats())
    }

    /// 关闭会话
    pub fn close(&self, id: &Uuid) -> bool {
        let removed = self.sessions.write().remove(id).is_some();
        if removed {
            info!("会话已关闭: {}", id);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

impl Default for SessionPool {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
