//! Structured JSON logging to stderr.
//!
//! Each line is a JSON object: `level`, `msg`, the caller's key-value fields, then `ts`.
//!
//! ```json
//! {"level":"info","msg":"token decoded","keys":"2","ts":"2025-01-16T10:30:00.000Z"}
//! {"level":"error","msg":"command failed","error":"invalid continuation token","ts":"2025-01-16T10:30:02.000Z"}
//! ```
//!
//! Lines below the configured level are skipped before their fields are formatted.

use std::io::Write;
use std::sync::atomic::{AtomicU8, Ordering};

use chrono::{SecondsFormat, Utc};
use serde::Deserialize;

/// Log severity, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl Level {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Level named by a `log!` macro identifier; unknown names log at info.
    pub fn from_ident(name: &str) -> Self {
        match name {
            "debug" => Self::Debug,
            "warn" => Self::Warn,
            "error" => Self::Error,
            _ => Self::Info,
        }
    }
}

static MAX_LEVEL: AtomicU8 = AtomicU8::new(Level::Info as u8);

/// Set the lowest level that gets written.
pub fn set_max_level(level: Level) {
    MAX_LEVEL.store(level as u8, Ordering::Relaxed);
}

/// Whether a line at `level` would be written.
pub fn enabled(level: Level) -> bool {
    level as u8 >= MAX_LEVEL.load(Ordering::Relaxed)
}

fn push_json_str(out: &mut String, s: &str) {
    out.push_str(&serde_json::Value::from(s).to_string());
}

/// Build one log line. Field order is kept as given.
pub fn build_line(level: Level, msg: &str, fields: &[(&str, String)]) -> String {
    let mut out = String::with_capacity(64 + msg.len() + fields.len() * 24);

    out.push_str(r#"{"level":"#);
    push_json_str(&mut out, level.as_str());
    out.push_str(r#","msg":"#);
    push_json_str(&mut out, msg);

    for (key, value) in fields {
        out.push(',');
        push_json_str(&mut out, key);
        out.push(':');
        push_json_str(&mut out, value);
    }

    out.push_str(r#","ts":"#);
    push_json_str(
        &mut out,
        &Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    );
    out.push('}');
    out
}

/// Write one line to stderr.
pub fn emit(level: Level, msg: &str, fields: &[(&str, String)]) {
    let _ = writeln!(std::io::stderr(), "{}", build_line(level, msg, fields));
}

/// Structured logging macro with key-value pairs.
///
/// ```ignore
/// log!(info, "token decoded", keys: 2, sort: &spec);
/// log!(warn, "profile has no table");
/// ```
macro_rules! log {
    ($level:ident, $msg:expr $(, $key:ident : $value:expr)* $(,)?) => {{
        let level = $crate::log::Level::from_ident(stringify!($level));
        if $crate::log::enabled(level) {
            let fields: &[(&str, String)] = &[
                $( (stringify!($key), format!("{}", $value)) ),*
            ];
            $crate::log::emit(level, $msg, fields);
        }
    }};
}

pub(crate) use log;
