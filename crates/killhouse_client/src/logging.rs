use killhouse_simulation::logger::{LogLevel, LogPrinter};

/// Core logger → bevy::log (tracing), чтобы всё шло в один поток
pub struct BevyLogPrinter;

impl LogPrinter for BevyLogPrinter {
    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Debug => bevy::log::debug!("{}", message),
            LogLevel::Info => bevy::log::info!("{}", message),
            LogLevel::Warning => bevy::log::warn!("{}", message),
            LogLevel::Error => bevy::log::error!("{}", message),
        }
    }
}
