pub mod debounce;

pub use debounce::Debouncer;

use log::info;

/// Initializes stdout logging for binaries hosting the overlay.
pub fn setup_logging() -> Result<(), fern::InitError> {
    setup_logging_with_level(log::LevelFilter::Info)
}

pub fn setup_logging_with_level(level: log::LevelFilter) -> Result<(), fern::InitError> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}][{}] {}",
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .level_for("hyper", log::LevelFilter::Warn)
        .level_for("reqwest", log::LevelFilter::Warn)
        .level_for("rustls", log::LevelFilter::Warn)
        .chain(std::io::stdout())
        .apply()?;
    info!("Logging initialized.");
    Ok(())
}
