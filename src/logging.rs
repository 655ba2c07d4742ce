//! JSON-lines logger writing to stdout and, unless disabled, to a log file.

use chrono::Local; // timestamp in log lines
use env_logger::{Env, Target};
use std::env;
use std::fs::OpenOptions;
use std::io::{self, Write};

/// Default file sink, overridden by `LOG_FILE` (empty value disables it).
pub const DEFAULT_LOG_FILE: &str = "app.log";

/// Duplicates every write into two sinks.
pub struct TeeWriter<A, B> {
    first: A,
    second: B,
}

impl<A: Write, B: Write> TeeWriter<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }
}

impl<A: Write, B: Write> Write for TeeWriter<A, B> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.first.write_all(buf)?;
        self.second.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.first.flush()?;
        self.second.flush()
    }
}

fn log_target() -> io::Result<Target> {
    let path = env::var("LOG_FILE").unwrap_or_else(|_| DEFAULT_LOG_FILE.to_string());
    if path.trim().is_empty() {
        return Ok(Target::Stdout);
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;
    Ok(Target::Pipe(Box::new(TeeWriter::new(io::stdout(), file))))
}

pub fn init_logger() -> io::Result<()> {
    let target = log_target()?;
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(target)
        .init();
    Ok(())
}
