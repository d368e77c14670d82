//! Log sanitization: strip patient attribute values from formatted output.
//!
//! Request records carry health data. The pipeline never logs a record on
//! purpose, but serde and pipeline error messages can quote individual
//! values, and debug logging of a `RawRecord` would quote all of them. The
//! writer here redacts any `Attribute: value` / `"Attribute": value` /
//! `attribute=value` pair for the ten schema attributes before a line reaches
//! its sink.
//!
//! # Performance / DoS
//!
//! Lines longer than the configured cap (`TENSIO_SANITIZE_MAX_BYTES`, default
//! 16 KiB) are redacted first, then cut at a character boundary and marked
//! `[TRUNCATED]`. An unterminated line that outgrows twice the cap is emitted
//! the same way and the rest of it is dropped.

use regex::Regex;
use std::sync::OnceLock;
use tracing_subscriber::fmt::MakeWriter;

use crate::domain::Attribute;

/// Per-line cap used when none is configured.
pub const DEFAULT_SANITIZE_MAX_BYTES: usize = 16 * 1024;

const REDACTED: &str = "[REDACTED]";

static ATTRIBUTE_VALUE: OnceLock<Regex> = OnceLock::new();

fn attribute_value_pattern() -> &'static Regex {
    ATTRIBUTE_VALUE.get_or_init(|| {
        let names = Attribute::ALL
            .iter()
            .map(|a| regex::escape(a.name()))
            .collect::<Vec<_>>()
            .join("|");
        // Name (optionally quoted), then `:` or `=`, then a quoted string
        // (possibly cut before its closing quote) or a bare token up to the
        // next delimiter.
        let pattern = format!(
            r#"(?i)(\b(?:{names})\b"?\s*[:=]\s*)(?:"[^"]*"?|[^\s,}}\]"]+)"#
        );
        Regex::new(&pattern).expect("Valid regex")
    })
}

fn truncate_to_char_boundary(input: &str, max_bytes: usize) -> (&str, bool) {
    if input.len() <= max_bytes {
        return (input, false);
    }

    let mut end = max_bytes;
    while end > 0 && !input.is_char_boundary(end) {
        end -= 1;
    }
    (&input[..end], true)
}

/// Redact attribute values in `input`, capped at the default line size.
#[must_use]
pub fn sanitize(input: &str) -> String {
    sanitize_with_limit(input, DEFAULT_SANITIZE_MAX_BYTES)
}

fn sanitize_with_limit(input: &str, max_bytes: usize) -> String {
    let (body, newline) = match input.strip_suffix('\n') {
        Some(body) => (body, "\n"),
        None => (input, ""),
    };

    let redacted =
        attribute_value_pattern().replace_all(body, format!("${{1}}{REDACTED}").as_str());
    let (prefix, truncated) = truncate_to_char_boundary(&redacted, max_bytes);

    let mut out = String::with_capacity(prefix.len() + 13);
    out.push_str(prefix);
    if truncated {
        out.push_str(" [TRUNCATED]");
    }
    out.push_str(newline);
    out
}

/// Whether `input` contains an attribute value that [`sanitize`] would redact.
#[must_use]
pub fn contains_patient_data(input: &str) -> bool {
    attribute_value_pattern().is_match(input)
}

/// A `tracing_subscriber` writer wrapper that sanitizes each formatted log
/// line before it is written to the underlying sink.
#[derive(Debug, Clone)]
pub struct SanitizingMakeWriter<M> {
    inner: M,
    max_bytes: usize,
}

impl<M> SanitizingMakeWriter<M> {
    #[must_use]
    pub fn new(inner: M) -> Self {
        Self::with_max_bytes(inner, DEFAULT_SANITIZE_MAX_BYTES)
    }

    /// Wrap `inner`, capping each line at `max_bytes` (at least 1).
    #[must_use]
    pub fn with_max_bytes(inner: M, max_bytes: usize) -> Self {
        Self {
            inner,
            max_bytes: max_bytes.max(1),
        }
    }
}

pub struct SanitizingWriter<W> {
    inner: W,
    buffer: Vec<u8>,
    max_bytes: usize,
    /// Dropping the tail of an oversized line until its newline arrives.
    discarding: bool,
}

impl<W> SanitizingWriter<W>
where
    W: std::io::Write,
{
    fn new(inner: W, max_bytes: usize) -> Self {
        Self {
            inner,
            buffer: Vec::new(),
            max_bytes,
            discarding: false,
        }
    }

    fn write_sanitized(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        let text = String::from_utf8_lossy(bytes);
        self.inner
            .write_all(sanitize_with_limit(&text, self.max_bytes).as_bytes())
    }

    fn flush_lines(&mut self) -> std::io::Result<()> {
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if self.discarding {
                self.discarding = false;
                continue;
            }
            self.write_sanitized(&line)?;
        }
        Ok(())
    }
}

impl<W> std::io::Write for SanitizingWriter<W>
where
    W: std::io::Write,
{
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        self.flush_lines()?;

        if self.discarding {
            self.buffer.clear();
        } else if self.buffer.len() > self.max_bytes.saturating_mul(2) {
            // A formatter that never emits a newline must not grow the buffer
            // without bound.
            let pending = std::mem::take(&mut self.buffer);
            self.write_sanitized(&pending)?;
            self.inner.write_all(b"\n")?;
            self.discarding = true;
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_lines()?;
        if self.discarding {
            self.buffer.clear();
        } else if !self.buffer.is_empty() {
            let pending = std::mem::take(&mut self.buffer);
            self.write_sanitized(&pending)?;
        }
        self.inner.flush()
    }
}

impl<'a, M> MakeWriter<'a> for SanitizingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = SanitizingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        SanitizingWriter::new(self.inner.make_writer(), self.max_bytes)
    }
}
