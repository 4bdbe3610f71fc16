use anyhow::Result;
use multitrack_recorder::Config;
use tracing::info;

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cfg = Config::load("config/recorder")?;

    info!("Multitrack Recorder v0.1.0");
    info!("Loaded config: {}", cfg.service.name);
    info!(
        "Audio format: {}Hz, {} channels, {}ms frames",
        cfg.audio.sample_rate, cfg.audio.channels, cfg.audio.frame_duration_ms
    );
    info!("Recording data root: {}", cfg.audio.data_root);
    info!(
        "Muxer: {} -> {} @ {} (.{} container)",
        cfg.muxer.ffmpeg_path, cfg.muxer.codec, cfg.muxer.bitrate, cfg.muxer.container
    );

    std::fs::create_dir_all(&cfg.audio.data_root)?;
    info!("Data root ready; waiting for a platform integration to drive the recorder");

    Ok(())
}
