//! 融合核心

pub mod modality;
pub mod catalog;
pub mod result;
pub mod scorer;
pub mod classifier;
pub mod fusion;
pub mod selector;
pub mod composer;
pub mod engine;
pub mod session;
