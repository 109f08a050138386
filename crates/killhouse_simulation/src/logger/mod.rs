//! Глобальный pluggable logger
//!
//! Core не зависит от bevy_log (headless сборка без `bevy_log` feature),
//! поэтому пишем через `LogPrinter`:
//! - headless / тесты → `ConsoleLogger` (stdout, warning+ в stderr)
//! - клиент → свой printer, который форвардит в `bevy::log`
//!
//! Сообщения ниже порога отбрасываются до форматирования timestamp.

use once_cell::sync::Lazy;
use std::sync::{Arc, Mutex, MutexGuard};

/// Printer + порог под одним lock'ом
struct Sink {
    printer: Option<Arc<dyn LogPrinter>>,
    threshold: LogLevel,
}

static SINK: Lazy<Mutex<Sink>> = Lazy::new(|| {
    Mutex::new(Sink {
        printer: None,
        threshold: LogLevel::Debug,
    })
});

/// Poisoned mutex = паника внутри printer'а; состояние sink'а всё равно валидно
fn sink() -> MutexGuard<'static, Sink> {
    SINK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    pub fn label(self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    /// "debug" / "info" / "warn" / "error" (регистр не важен)
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warning),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }
}

pub trait LogPrinter: Send + Sync {
    fn log(&self, level: LogLevel, message: &str);
}

/// Заменяет текущий printer
pub fn set_logger(printer: Box<dyn LogPrinter>) {
    sink().printer = Some(Arc::from(printer));
}

/// Ставит printer, только если никто не поставил раньше (клиент ставит свой до plugin'ов)
pub fn set_logger_if_needed(printer: Box<dyn LogPrinter>) {
    let mut sink = sink();
    if sink.printer.is_none() {
        sink.printer = Some(Arc::from(printer));
    }
}

pub fn set_log_level(level: LogLevel) {
    sink().threshold = level;
}

pub fn log_level() -> LogLevel {
    sink().threshold
}

pub fn log(message: &str) {
    log_with_level(LogLevel::Debug, message);
}

pub fn log_info(message: &str) {
    log_with_level(LogLevel::Info, message);
}

pub fn log_warning(message: &str) {
    log_with_level(LogLevel::Warning, message);
}

pub fn log_error(message: &str) {
    log_with_level(LogLevel::Error, message);
}

/// Printer вызывается без lock'а: он может сам логировать через этот модуль
pub fn log_with_level(level: LogLevel, message: &str) {
    let printer = {
        let sink = sink();
        if level < sink.threshold {
            return;
        }
        match sink.printer.as_ref() {
            Some(printer) => Arc::clone(printer),
            None => return,
        }
    };
    let stamp = chrono::Local::now().format("%H:%M:%S%.3f");
    printer.log(level, &format!("{} {}", stamp, message));
}

/// stdout для debug/info, stderr для warning/error
pub struct ConsoleLogger;

impl LogPrinter for ConsoleLogger {
    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Debug | LogLevel::Info => println!("{:<5} {}", level.label(), message),
            LogLevel::Warning | LogLevel::Error => eprintln!("{:<5} {}", level.label(), message),
        }
    }
}

/// ConsoleLogger по умолчанию; порог из `KILLHOUSE_LOG`, если задан
pub fn init_logger() {
    set_logger_if_needed(Box::new(ConsoleLogger));

    if let Some(level) = std::env::var("KILLHOUSE_LOG").ok().as_deref().and_then(LogLevel::parse) {
        set_log_level(level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warning);
        assert!(LogLevel::Warning < LogLevel::Error);
    }

    #[test]
    fn test_parse_level_names() {
        assert_eq!(LogLevel::parse("WARN"), Some(LogLevel::Warning));
        assert_eq!(LogLevel::parse("warning"), Some(LogLevel::Warning));
        assert_eq!(LogLevel::parse("Info"), Some(LogLevel::Info));
        assert_eq!(LogLevel::parse("trace"), None);
    }

    static CAPTURED: Lazy<Mutex<Vec<String>>> = Lazy::new(|| Mutex::new(Vec::new()));

    /// Printer, который сам ходит в logger (как printer'ы, пишущие через core)
    struct ReentrantPrinter;

    impl LogPrinter for ReentrantPrinter {
        fn log(&self, _level: LogLevel, message: &str) {
            let threshold = log_level();
            let mut captured = CAPTURED.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            captured.push(format!("{:?} {}", threshold, message));
            if message.ends_with("outer") {
                drop(captured);
                log_error("inner");
            }
        }
    }

    #[test]
    fn test_printer_can_log_from_inside() {
        set_logger(Box::new(ReentrantPrinter));
        log_error("outer");
        set_logger(Box::new(ConsoleLogger));

        let captured = CAPTURED.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        assert!(captured.iter().any(|line| line.ends_with(" outer")));
        assert!(captured.iter().any(|line| line.ends_with(" inner")));
    }
}
