//! 非语言融合引擎演示
//!
//! 用合成的手势 / 注视 / 表情流驱动引擎并输出解读
//! 用法: nonverbal-fusion [engine.toml]

use std::path::Path;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use nonverbal_fusion::{
    EngineConfig, EngineEvent, FusionEngine, LinearClassifier, LinearClassifierWeights, Modality,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::from_toml_file(Path::new(&path))?,
        None => EngineConfig::default(),
    };

    info!("=== 非语言融合引擎 ===");

    info!("\n=== 场景1: 冷启动 ===");
    demo_cold_start(&config);

    info!("\n=== 场景2: 稳定信号 ===");
    demo_steady_signal(&config);

    info!("\n=== 场景3: 手势分类器 ===");
    demo_learned_gesture(&config)?;

    Ok(())
}

fn demo_cold_start(config: &EngineConfig) {
    let mut engine = FusionEngine::new(config.clone());
    for (i, frame) in mixed_stream().take(2).enumerate() {
        let out = engine.process(frame.0, frame.1, frame.2);
        info!("  tick {}: {} ({})", i + 1, out.response_text, out.primary_type.as_str());
    }
}

fn demo_steady_signal(config: &EngineConfig) {
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let mut engine = FusionEngine::new(config.clone()).with_event_channel(event_tx);

    let mut last = None;
    for _ in 0..5 {
        last = Some(engine.process(
            vec![0.5, 0.5, 0.0, 0.0],
            vec![0.5, 0.5, 0.2],
            vec![0.8, 0.1, 0.0, 0.1, 0.3],
        ));
    }

    if let Some(out) = last {
        info!(
            "  主结果: {} / {} (置信度: {:.0}%)",
            out.primary_type.as_str(),
            out.primary_result.pattern(),
            out.primary_result.confidence() * 100.0
        );
        info!("  解读: {}", out.response_text);
        match serde_json::to_string_pretty(&out.combined_result) {
            Ok(json) => info!("  组合结果:\n{}", json),
            Err(e) => info!("  组合结果序列化失败: {}", e),
        }
    }

    let transitions: Vec<_> = std::iter::from_fn(|| event_rx.try_recv().ok())
        .filter(|e| matches!(e, EngineEvent::StateChanged { .. }))
        .collect();
    info!("  状态迁移: {} 次", transitions.len());
}

fn demo_learned_gesture(config: &EngineConfig) -> anyhow::Result<()> {
    // 演示权重: 前两维 (x, y) 大 → help，小 → yes
    let classifier = LinearClassifier::from_weights(LinearClassifierWeights {
        labels: vec!["yes".into(), "help".into()],
        weights: vec![vec![-2.0, -2.0, 0.0, 0.0], vec![2.0, 2.0, 0.0, 0.0]],
        bias: vec![2.0, -2.0],
    })?;

    let mut engine = FusionEngine::new(config.clone())
        .with_classifier(Modality::Gesture, Arc::new(classifier));

    for (i, frame) in mixed_stream().take(14).enumerate() {
        let out = engine.process(frame.0, frame.1, frame.2);
        if i % 3 == 2 || i == 13 {
            info!(
                "  tick {:>2} [{:?}] 手势={} ({:?}, {:.2}) → {}",
                i + 1,
                engine.state(Modality::Gesture),
                out.gesture_result.pattern,
                out.gesture_result.extra.source,
                out.gesture_result.confidence,
                out.response_text
            );
        }
    }

    let stats = engine.stats();
    info!("  统计: ticks={}, 缓冲={:?}", stats.ticks, stats.buffer_lengths);

    engine.clear_buffers();
    info!("  清空后状态: {:?}", engine.state(Modality::Gesture));

    Ok(())
}

// ============================================================
// 模拟数据生成
// ============================================================

/// 缓慢变化的三模态流
fn mixed_stream() -> impl Iterator<Item = (Vec<f32>, Vec<f32>, Vec<f32>)> {
    (0..).map(|i| {
        let t = i as f32 * 0.1;
        let gesture = vec![1.2 + t.sin() * 0.2, 1.0 + t.cos() * 0.2, 0.3, 0.1];
        let gaze = vec![0.5, 0.4 + t * 0.05, 0.25];
        let emotion = vec![0.2 + t * 0.03, 0.1, 0.05, 0.15, 0.5];
        (gesture, gaze, emotion)
    })
}
