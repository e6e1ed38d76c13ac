//! Startup logging

use std::io::Write;
use std::path::Path;

use log::{LevelFilter, info};
use simplelog::{Config, WriteLogger};

use crate::settings::ViewerSettings;

/// Install the file logger, then load settings through it.
///
/// The logger is installed before the settings file is read so that its
/// outcome is recorded. Until settings are known the level is `cli_level`
/// or `Info`; afterwards `cli_level` wins over the settings `log_level`.
pub fn init_with_settings<W: Write + Send + 'static>(
    writer: W,
    cli_level: Option<LevelFilter>,
    config: Option<&Path>,
) -> anyhow::Result<ViewerSettings> {
    WriteLogger::init(LevelFilter::Trace, Config::default(), writer)?;
    log::set_max_level(cli_level.unwrap_or(LevelFilter::Info));

    let settings = ViewerSettings::load_or_default(config);
    let level = cli_level.unwrap_or_else(|| settings.level_filter());
    log::set_max_level(level);
    info!("Log level {level}");
    Ok(settings)
}
