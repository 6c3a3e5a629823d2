//! 缓冲区模块

pub mod modality;

pub use modality::{FeatureVector, ModalityBuffer};
