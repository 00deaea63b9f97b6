//! Process-wide leveled logging for the node crates.
//!
//! Records go to stderr as text or JSON lines and can additionally be kept in
//! a bounded in-memory ring so tests and status endpoints can inspect them.

use std::collections::VecDeque;
use std::fmt;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::{Mutex, OnceLock};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde_json::json;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub enum Level {
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
    Trace = 5,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Error => "ERROR",
            Self::Warn => "WARN",
            Self::Info => "INFO",
            Self::Debug => "DEBUG",
            Self::Trace => "TRACE",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "error" => Some(Self::Error),
            "warn" | "warning" => Some(Self::Warn),
            "info" => Some(Self::Info),
            "debug" => Some(Self::Debug),
            "trace" => Some(Self::Trace),
            _ => None,
        }
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Error,
            2 => Self::Warn,
            3 => Self::Info,
            4 => Self::Debug,
            _ => Self::Trace,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Format {
    Text = 0,
    Json = 1,
}

impl Format {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "text" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct LogConfig {
    pub level: Level,
    pub format: Format,
    pub timestamps: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::Info,
            format: Format::Text,
            timestamps: true,
        }
    }
}

static MAX_LEVEL: AtomicU8 = AtomicU8::new(Level::Info as u8);
static JSON_OUTPUT: AtomicBool = AtomicBool::new(false);
static TIMESTAMPS: AtomicBool = AtomicBool::new(true);
static STDERR: AtomicBool = AtomicBool::new(true);

/// A log record retained by the capture ring.
#[derive(Clone, Debug)]
pub struct CapturedLog {
    pub ts_ms: u64,
    pub level: Level,
    pub target: &'static str,
    pub file: &'static str,
    pub line: u32,
    pub msg: String,
}

struct Capture {
    capacity: AtomicUsize,
    records: Mutex<VecDeque<CapturedLog>>,
}

static CAPTURE: OnceLock<Capture> = OnceLock::new();

fn capture() -> Option<&'static Capture> {
    let capture = CAPTURE.get()?;
    if capture.capacity.load(Ordering::Relaxed) == 0 {
        return None;
    }
    Some(capture)
}

pub fn init(config: LogConfig) {
    MAX_LEVEL.store(config.level as u8, Ordering::Relaxed);
    JSON_OUTPUT.store(matches!(config.format, Format::Json), Ordering::Relaxed);
    TIMESTAMPS.store(config.timestamps, Ordering::Relaxed);
}

pub fn max_level() -> Level {
    Level::from_u8(MAX_LEVEL.load(Ordering::Relaxed))
}

pub fn enabled(level: Level) -> bool {
    level as u8 <= MAX_LEVEL.load(Ordering::Relaxed)
}

pub fn set_stderr_enabled(enabled: bool) {
    STDERR.store(enabled, Ordering::Relaxed);
}

/// Starts keeping the newest `capacity` records in memory. Zero disables.
pub fn enable_capture(capacity: usize) {
    let capture = CAPTURE.get_or_init(|| Capture {
        capacity: AtomicUsize::new(0),
        records: Mutex::new(VecDeque::new()),
    });
    capture.capacity.store(capacity, Ordering::Relaxed);
    if let Ok(mut records) = capture.records.lock() {
        while records.len() > capacity {
            records.pop_front();
        }
    }
}

pub fn disable_capture() {
    enable_capture(0);
}

pub fn clear_captured_logs() {
    if let Some(capture) = CAPTURE.get() {
        if let Ok(mut records) = capture.records.lock() {
            records.clear();
        }
    }
}

/// Returns up to `limit` of the most recent captured records, oldest first.
pub fn capture_snapshot(limit: usize) -> Vec<CapturedLog> {
    let Some(capture) = CAPTURE.get() else {
        return Vec::new();
    };
    let Ok(records) = capture.records.lock() else {
        return Vec::new();
    };
    let skip = records.len().saturating_sub(limit);
    records.iter().skip(skip).cloned().collect()
}

pub fn log(
    level: Level,
    target: &'static str,
    file: &'static str,
    line: u32,
    args: fmt::Arguments<'_>,
) {
    if !enabled(level) {
        return;
    }
    let since_epoch = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    let ts_ms = u64::try_from(since_epoch.as_millis()).unwrap_or(u64::MAX);
    let msg = args.to_string();

    if STDERR.load(Ordering::Relaxed) {
        let mut out = io::stderr().lock();
        if JSON_OUTPUT.load(Ordering::Relaxed) {
            let record = json!({
                "ts_ms": ts_ms,
                "level": level.as_str(),
                "target": target,
                "file": file,
                "line": line,
                "msg": msg,
            });
            let _ = writeln!(out, "{record}");
        } else if TIMESTAMPS.load(Ordering::Relaxed) {
            let _ = writeln!(out, "{} {level} {target}: {msg}", Rfc3339(since_epoch));
        } else {
            let _ = writeln!(out, "{level} {target}: {msg}");
        }
    }

    if let Some(capture) = capture() {
        let capacity = capture.capacity.load(Ordering::Relaxed);
        if let Ok(mut records) = capture.records.lock() {
            records.push_back(CapturedLog {
                ts_ms,
                level,
                target,
                file,
                line,
                msg,
            });
            while records.len() > capacity {
                records.pop_front();
            }
        }
    }
}

#[macro_export]
macro_rules! log_at {
    ($level:expr, $($arg:tt)*) => {{
        if $crate::enabled($level) {
            $crate::log($level, module_path!(), file!(), line!(), format_args!($($arg)*));
        }
    }};
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {{
        $crate::log_at!($crate::Level::Error, $($arg)*);
    }};
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {{
        $crate::log_at!($crate::Level::Warn, $($arg)*);
    }};
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {{
        $crate::log_at!($crate::Level::Info, $($arg)*);
    }};
}

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {{
        $crate::log_at!($crate::Level::Debug, $($arg)*);
    }};
}

#[macro_export]
macro_rules! log_trace {
    ($($arg:tt)*) => {{
        $crate::log_at!($crate::Level::Trace, $($arg)*);
    }};
}

/// UTC timestamp with millisecond precision.
struct Rfc3339(Duration);

impl fmt::Display for Rfc3339 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.0.as_secs();
        let (year, month, day) = civil_date(secs / 86_400);
        let rem = secs % 86_400;
        write!(
            f,
            "{year:04}-{month:02}-{day:02}T{:02}:{:02}:{:02}.{:03}Z",
            rem / 3600,
            (rem % 3600) / 60,
            rem % 60,
            self.0.subsec_millis()
        )
    }
}

// Days since 1970-01-01 to a proleptic Gregorian date (Hinnant's algorithm).
fn civil_date(days: u64) -> (u64, u64, u64) {
    let z = days + 719_468;
    let era = z / 146_097;
    let doe = z % 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + u64::from(month <= 2);
    (year, month, day)
}
