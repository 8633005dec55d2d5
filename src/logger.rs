use chrono::{DateTime, Utc};
use colored::*;
use log::{Level, Metadata, Record};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use uuid::Uuid;

static LOGGER: Lazy<PostforgeLogger> = Lazy::new(PostforgeLogger::new);

pub fn init() -> Result<(), String> {
    init_with_config(LoggerConfig::default())
}

pub fn init_with_config(config: LoggerConfig) -> Result<(), String> {
    LOGGER.update_config(config.clone());

    if let Err(e) = log::set_logger(&*LOGGER) {
        return Err(format!("Failed to set logger: {:?}", e));
    }

    log::set_max_level(config.min_level.to_log_level_filter());
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
}

impl LogLevel {
    pub fn color(&self) -> Color {
        match self {
            LogLevel::Trace => Color::Cyan,
            LogLevel::Debug => Color::Blue,
            LogLevel::Info => Color::Green,
            LogLevel::Warn => Color::Yellow,
            LogLevel::Error => Color::Red,
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            LogLevel::Trace => "🔍",
            LogLevel::Debug => "🐛",
            LogLevel::Info => "💡",
            LogLevel::Warn => "⚠️",
            LogLevel::Error => "❌",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    pub fn to_log_level(&self) -> Level {
        match self {
            LogLevel::Trace => Level::Trace,
            LogLevel::Debug => Level::Debug,
            LogLevel::Info => Level::Info,
            LogLevel::Warn => Level::Warn,
            LogLevel::Error => Level::Error,
        }
    }

    pub fn to_log_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Trace => log::LevelFilter::Trace,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
        }
    }

    pub fn from_log_level(level: Level) -> Self {
        match level {
            Level::Trace => LogLevel::Trace,
            Level::Debug => LogLevel::Debug,
            Level::Info => LogLevel::Info,
            Level::Warn => LogLevel::Warn,
            Level::Error => LogLevel::Error,
        }
    }
}

/// Structured log entry, serialized as-is in JSON output mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    pub module: String,
    pub line: u32,
    pub request_id: Option<u64>,
    pub duration_ms: Option<u64>,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: String, module: String, line: u32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            level,
            message,
            module,
            line,
            request_id: None,
            duration_ms: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub min_level: LogLevel,
    pub show_colors: bool,
    pub show_emojis: bool,
    pub show_module: bool,
    pub include_timestamp: bool,
    pub timestamp_format: String,
    pub output_json: bool,
    pub log_to_file: bool,
    pub log_file_path: String,
    pub custom_prefix: Option<String>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Info,
            show_colors: true,
            show_emojis: true,
            show_module: true,
            include_timestamp: true,
            timestamp_format: "%Y-%m-%d %H:%M:%S%.3f".to_string(),
            output_json: false,
            log_to_file: false,
            log_file_path: "postforge.log".to_string(),
            custom_prefix: None,
        }
    }
}

impl LoggerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    pub fn with_colors(mut self, enabled: bool) -> Self {
        self.show_colors = enabled;
        self
    }

    pub fn with_file_output(mut self, path: &str) -> Self {
        self.log_to_file = true;
        self.log_file_path = path.to_string();
        self
    }

    pub fn with_json_output(mut self, enabled: bool) -> Self {
        self.output_json = enabled;
        self
    }

    pub fn production() -> Self {
        Self {
            min_level: LogLevel::Info,
            show_colors: false,
            show_emojis: false,
            output_json: true,
            log_to_file: true,
            ..Default::default()
        }
    }

    pub fn development() -> Self {
        Self {
            min_level: LogLevel::Debug,
            show_colors: true,
            show_emojis: true,
            output_json: false,
            ..Default::default()
        }
    }
}

pub struct PostforgeLogger {
    config: Mutex<LoggerConfig>,
    log_file: Mutex<Option<File>>,
}

impl PostforgeLogger {
    pub fn new() -> Self {
        Self {
            config: Mutex::new(LoggerConfig::default()),
            log_file: Mutex::new(None),
        }
    }

    pub fn update_config(&self, new_config: LoggerConfig) {
        if new_config.log_to_file {
            if let Ok(file) = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&new_config.log_file_path)
            {
                *self.log_file.lock().unwrap() = Some(file);
            }
        }
        *self.config.lock().unwrap() = new_config;
    }

    fn format_console_output(&self, entry: &LogEntry, config: &LoggerConfig) -> String {
        let mut output = String::new();

        if let Some(prefix) = &config.custom_prefix {
            output.push_str(&format!("[{}] ", prefix.bright_white().bold()));
        }

        if config.include_timestamp {
            let timestamp = entry.timestamp.format(&config.timestamp_format).to_string();
            if config.show_colors {
                output.push_str(&format!("{} ", timestamp.bright_black()));
            } else {
                output.push_str(&format!("{} ", timestamp));
            }
        }

        let level_str = if config.show_emojis {
            format!("{} {}", entry.level.emoji(), entry.level.as_str())
        } else {
            entry.level.as_str().to_string()
        };
        if config.show_colors {
            output.push_str(&format!(
                "[{}] ",
                level_str.color(entry.level.color()).bold()
            ));
        } else {
            output.push_str(&format!("[{}] ", level_str));
        }

        if config.show_module && !entry.module.is_empty() {
            if config.show_colors {
                output.push_str(&format!("{}::", entry.module.bright_blue()));
            } else {
                output.push_str(&format!("{}::", entry.module));
            }
        }

        if config.show_colors {
            output.push_str(&entry.message.white().bold().to_string());
        } else {
            output.push_str(&entry.message);
        }

        if let Some(request_id) = entry.request_id {
            output.push_str(&format!(" [req:{}]", request_id));
        }

        if let Some(duration) = entry.duration_ms {
            output.push_str(&format!(" [{}ms]", duration));
        }

        output
    }

    fn write_to_file(&self, entry: &LogEntry, config: &LoggerConfig) {
        if let Ok(mut guard) = self.log_file.lock() {
            if let Some(ref mut file) = *guard {
                let content = if config.output_json {
                    serde_json::to_string(entry).unwrap_or_default() + "\n"
                } else {
                    self.format_console_output(entry, config) + "\n"
                };
                let _ = file.write_all(content.as_bytes());
                let _ = file.flush();
            }
        }
    }
}

impl log::Log for PostforgeLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        if let Ok(config) = self.config.lock() {
            metadata.level() <= config.min_level.to_log_level()
        } else {
            true
        }
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let entry = LogEntry::new(
            LogLevel::from_log_level(record.level()),
            record.args().to_string(),
            record.module_path().unwrap_or("unknown").to_string(),
            record.line().unwrap_or(0),
        );

        if let Ok(config) = self.config.lock() {
            if config.output_json {
                println!("{}", serde_json::to_string(&entry).unwrap_or_default());
            } else {
                println!("{}", self.format_console_output(&entry, &config));
            }

            if config.log_to_file {
                self.write_to_file(&entry, &config);
            }
        }
    }

    fn flush(&self) {
        let _ = io::stdout().flush();
        if let Ok(mut guard) = self.log_file.lock() {
            if let Some(ref mut file) = *guard {
                let _ = file.flush();
            }
        }
    }
}

/// Timer that logs its elapsed time when dropped.
pub struct Timer {
    start: Instant,
    name: String,
}

impl Timer {
    pub fn new(name: &str) -> Self {
        log::debug!("⏱️  Starting timer: {}", name);
        Self {
            start: Instant::now(),
            name: name.to_string(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        log::info!(
            "⏱️  '{}' completed in {:.2}ms",
            self.name,
            self.elapsed().as_secs_f64() * 1000.0
        );
    }
}

pub fn timer(name: &str) -> Timer {
    Timer::new(name)
}
