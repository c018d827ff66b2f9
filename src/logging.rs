// Copyright (c) 2020 White Leaf
//
// This software is released under the MIT License.
// https://opensource.org/licenses/MIT

use anyhow::{anyhow, Error};
use config::LogConfig;
use file_rotate::{compression::Compression, suffix::AppendCount, ContentLimit, FileRotate};
use simplelog::{CombinedLogger, Config, LevelFilter, SharedLogger, SimpleLogger, WriteLogger};

pub fn level(config: &LogConfig) -> Result<LevelFilter, Error> {
    config
        .level
        .parse()
        .map_err(|_| anyhow!("Invalid log level '{}'", config.level))
}

/// `config.file` rotated once it reaches `max_bytes`, keeping `backups` old files
pub fn rotating_file(config: &LogConfig) -> FileRotate<AppendCount> {
    FileRotate::new(
        &config.file,
        AppendCount::new(config.backups),
        ContentLimit::Bytes(config.max_bytes),
        Compression::None,
        #[cfg(unix)]
        None,
    )
}

/// Log to `config.file`, and to the terminal too when `console` is set
pub fn init(config: &LogConfig, console: bool) -> Result<(), Error> {
    let level = level(config)?;
    let file = rotating_file(config);

    let mut loggers: Vec<Box<dyn SharedLogger>> =
        vec![WriteLogger::new(level, Config::default(), file)];
    if console {
        loggers.push(SimpleLogger::new(level, Config::default()));
    }

    CombinedLogger::init(loggers).map_err(|e| anyhow!("Couldn't set up logging: {}", e))
}
