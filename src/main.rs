use resample_stream::{
    common::{logger, types::AnyResult},
    configs::Config,
    transcode,
};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> AnyResult<()> {
    let config = Config::load()?;
    logger::init(&config);

    info!(
        "resample-stream v{} (commit {}, built {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_COMMIT"),
        env!("BUILD_TIME")
    );

    let Some(convert) = config.convert.as_ref() else {
        warn!("No [convert] section configured; nothing to do");
        return Ok(());
    };

    let report = transcode::transcode_file(&config.resampler, convert).await?;
    if !report.errors.is_empty() {
        return Err(format!("{} conversion error(s), first: {}", report.errors.len(), report.errors[0]).into());
    }
    Ok(())
}
