//! Document load progress reporting.
//!
//! Reports what `docqa` is doing while it fetches, chunks, and embeds a
//! document, which can take a while for a long PDF against a remote
//! embedding endpoint. Progress goes to **stderr** so stdout stays
//! parseable for scripts (`ask --format json`).

use std::io::Write;

use docqa_core::{BuildProgress, Document};

/// A single progress event for a document load.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProgressEvent {
    /// Fetching and extracting the document.
    Fetching { url: String },
    /// Text split into `chunks` chunks.
    Chunked { chars: usize, chunks: usize },
    /// `n` of `total` chunks embedded.
    Embedding { n: usize, total: usize },
}

/// Reports load progress. Implementations write to stderr (human or JSON).
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// Human-friendly progress on stderr: "embedding  120 / 1,040 chunks".
pub struct StderrProgress;

/// Human mode prints every this-many embedded chunks (and the last one).
const EMBED_REPORT_EVERY: usize = 25;

impl ProgressReporter for StderrProgress {
    fn report(&self, event: ProgressEvent) {
        let line = match &event {
            ProgressEvent::Fetching { url } => format!("fetching  {}\n", url),
            ProgressEvent::Chunked { chars, chunks } => format!(
                "chunked   {} chars into {} chunks\n",
                format_number(*chars),
                format_number(*chunks)
            ),
            ProgressEvent::Embedding { n, total } => {
                if *n != *total && n % EMBED_REPORT_EVERY != 0 {
                    return;
                }
                format!(
                    "embedding  {} / {} chunks\n",
                    format_number(*n),
                    format_number(*total)
                )
            }
        };
        let mut stderr = std::io::stderr().lock();
        let _ = stderr.write_all(line.as_bytes());
        let _ = stderr.flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl ProgressReporter for JsonProgress {
    fn report(&self, event: ProgressEvent) {
        let obj = match &event {
            ProgressEvent::Fetching { url } => serde_json::json!({
                "event": "progress",
                "phase": "fetching",
                "url": url,
            }),
            ProgressEvent::Chunked { chars, chunks } => serde_json::json!({
                "event": "progress",
                "phase": "chunked",
                "chars": chars,
                "chunks": chunks,
            }),
            ProgressEvent::Embedding { n, total } => serde_json::json!({
                "event": "progress",
                "phase": "embedding",
                "n": n,
                "total": total,
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let mut stderr = std::io::stderr().lock();
            let _ = writeln!(stderr, "{}", line);
            let _ = stderr.flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Forwards index-build callbacks as progress events.
pub struct EmbedProgress<'a>(pub &'a dyn ProgressReporter);

impl BuildProgress for EmbedProgress<'_> {
    fn chunked(&self, document: &Document, chunks: usize) {
        self.0.report(ProgressEvent::Chunked {
            chars: document.char_len(),
            chunks,
        });
    }

    fn embedded(&self, n: usize, total: usize) {
        self.0.report(ProgressEvent::Embedding { n, total });
    }
}

fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn reporter(&self) -> Box<dyn ProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}
