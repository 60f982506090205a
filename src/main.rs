use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{Level, error, info, warn};
use welcome_bot::announce::{
    DisplayAnnouncer, DisplayUpdate, FanoutAnnouncer, SpeechCommandAnnouncer, TracingAnnouncer,
};
use welcome_bot::intake::DirectoryFrameSource;
use welcome_bot::pipeline::recognition::HttpRecognizer;
use welcome_bot::{AppError, Configuration, CoordinatorBuilder};

const CONFIG_PATH_VAR: &str = "WELCOMEBOT_CONFIG";
const DISPLAY_CAPACITY: usize = 16;

fn init_logging(level: &str) {
    let level = Level::from_str(level).unwrap_or(Level::INFO);
    tracing_subscriber::fmt().with_max_level(level).init();
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config_path = std::env::var_os(CONFIG_PATH_VAR).map(PathBuf::from);
    let configuration = Configuration::load(config_path.as_deref())?;
    init_logging(&configuration.log_level);

    let recognizer = HttpRecognizer::new(&configuration.upload, configuration.identity.clone())
        .map_err(|e| AppError::Pipeline(format!("Failed to create recognizer: {e}")))?;

    let (display, mut display_rx) = DisplayAnnouncer::new(
        DISPLAY_CAPACITY,
        configuration.announce.display_clear_delay(),
    )?;
    let mut announcer = FanoutAnnouncer::new()
        .with(Box::new(TracingAnnouncer))
        .with(Box::new(display));
    if let Some(speech) = configuration
        .announce
        .speech_command
        .as_deref()
        .and_then(SpeechCommandAnnouncer::from_command)
    {
        announcer = announcer.with(Box::new(speech));
    }

    tokio::spawn(async move {
        loop {
            match display_rx.recv().await {
                Ok(DisplayUpdate::Show(announcement)) => {
                    info!(text = %announcement.text, "Display");
                }
                Ok(DisplayUpdate::Clear) => info!("Display cleared"),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "Display fell behind"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let source = DirectoryFrameSource::from_settings(&configuration.capture)?;
    let coordinator = CoordinatorBuilder::new(configuration)
        .recognizer(Arc::new(recognizer))
        .announcer(Box::new(announcer))
        .build()?;

    match source {
        Some(source) => {
            tokio::spawn(source.run(coordinator.handle(), coordinator.cancel_token()));
        }
        None => warn!("No capture directory configured, waiting for frames"),
    }

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| AppError::Pipeline(format!("Failed to wait for shutdown signal: {e}")))?;
    info!("Shutting down");
    coordinator.shutdown().await.inspect_err(|e| {
        error!("Pipeline did not stop cleanly: {}", e);
    })
}
