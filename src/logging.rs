//! Structured JSON-line logging.
//!
//! Every record is one JSON object on stderr carrying a run id, a sequence
//! number, level, domain and event name. When `LOG_DIR` is set the same line
//! is appended to `$LOG_DIR/<run_id>/events.jsonl`.
//!
//! `LOG_LEVEL` sets the minimum level (default `info`); `LOG_DOMAINS` is a
//! comma-separated allow list of domains, or `all`.

use chrono::Utc;
use serde_json::{json, Map, Value};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

const LEVELS: [Level; 6] = [
    Level::Trace,
    Level::Debug,
    Level::Info,
    Level::Warn,
    Level::Error,
    Level::Fatal,
];

impl Level {
    pub fn parse(name: &str) -> Option<Self> {
        LEVELS.into_iter().find(|l| l.as_str() == name)
    }

    pub fn threshold() -> Self {
        std::env::var("LOG_LEVEL")
            .ok()
            .and_then(|v| Level::parse(v.trim()))
            .unwrap_or(Level::Info)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Fatal => "fatal",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
    Data,    // CSV loading, manifest
    Render,  // Layout changes
    Http,    // Requests and responses
    System,  // Startup, shutdown, signals
    Profile, // Timings
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Data => "data",
            Domain::Render => "render",
            Domain::Http => "http",
            Domain::System => "system",
            Domain::Profile => "profile",
        }
    }

    fn allowed_by(&self, filter: Option<&str>) -> bool {
        match filter {
            None | Some("all") => true,
            Some(list) => list.split(',').any(|d| d.trim() == self.as_str()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.allowed_by(std::env::var("LOG_DOMAINS").ok().as_deref())
    }
}

static SEQ: AtomicU64 = AtomicU64::new(0);
static SINK: OnceLock<Sink> = OnceLock::new();

/// Process-wide destination for log lines.
struct Sink {
    run_id: String,
    file: Option<Mutex<BufWriter<File>>>,
}

impl Sink {
    fn get() -> &'static Sink {
        SINK.get_or_init(|| {
            let run_id = std::env::var("RUN_ID")
                .unwrap_or_else(|_| format!("r-{}-{}", Utc::now().timestamp_millis(), std::process::id()));
            let file = std::env::var("LOG_DIR")
                .ok()
                .and_then(|dir| Sink::open(Path::new(&dir), &run_id))
                .map(|f| Mutex::new(BufWriter::new(f)));
            Sink { run_id, file }
        })
    }

    fn open(dir: &Path, run_id: &str) -> Option<File> {
        let run_dir = dir.join(run_id);
        fs::create_dir_all(&run_dir)
            .and_then(|_| File::create(run_dir.join("events.jsonl")))
            .map_err(|err| eprintln!("[log] events file unavailable: {}", err))
            .ok()
    }

    fn write(&self, line: &str) {
        if let Some(file) = &self.file {
            if let Ok(mut w) = file.lock() {
                let _ = writeln!(w, "{}", line);
                let _ = w.flush();
            }
        }
        eprintln!("{}", line);
    }
}

/// RFC3339 timestamp with milliseconds.
pub fn ts_now() -> String {
    Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

pub fn log(level: Level, domain: Domain, event: &str, fields: Map<String, Value>) {
    if level < Level::threshold() || !domain.is_enabled() {
        return;
    }
    let sink = Sink::get();
    let seq = SEQ.fetch_add(1, Ordering::SeqCst);
    sink.write(&build_record(&sink.run_id, seq, level, domain, event, fields).to_string());
}

/// `msg` is lifted to the top level; every other field nests under `data`.
fn build_record(
    run_id: &str,
    seq: u64,
    level: Level,
    domain: Domain,
    event: &str,
    mut fields: Map<String, Value>,
) -> Value {
    let msg = fields.remove("msg").unwrap_or_else(|| json!(""));
    json!({
        "ts": ts_now(),
        "run_id": run_id,
        "seq": seq,
        "lvl": level.as_str().to_uppercase(),
        "component": domain.as_str(),
        "event": event,
        "msg": msg,
        "data": fields,
    })
}

pub fn obj(pairs: &[(&str, Value)]) -> Map<String, Value> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

pub fn v_str(s: &str) -> Value {
    Value::String(s.to_string())
}

pub fn v_num(n: f64) -> Value {
    json!(n)
}

/// Emits a `profile` trace event with the elapsed time when dropped.
pub struct ProfileScope {
    label: &'static str,
    context: Map<String, Value>,
    started: Instant,
}

impl ProfileScope {
    pub fn with_context(label: &'static str, fields: &[(&str, Value)]) -> Self {
        Self {
            label,
            context: obj(fields),
            started: Instant::now(),
        }
    }
}

impl Drop for ProfileScope {
    fn drop(&mut self) {
        let mut fields = std::mem::take(&mut self.context);
        fields.insert("label".to_string(), v_str(self.label));
        fields.insert("elapsed_ms".to_string(), v_num(self.started.elapsed().as_secs_f64() * 1000.0));
        log(Level::Trace, Domain::Profile, "profile", fields);
    }
}
