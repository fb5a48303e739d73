use std::path::Path;

use deferred_renderer::{DeferredApp, RendererConfig, SceneDescription};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = RendererConfig::default();
    let scene = SceneDescription::demo(Path::new("."));
    log::info!(
        "starting {} at {}x{}",
        config.window_title,
        config.window_width,
        config.window_height
    );

    DeferredApp::new(config, scene)?.run()
}
