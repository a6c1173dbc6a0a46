// Streaming engine for pvreplace
// Reads URLs line by line and writes every mutation as soon as it is built

use std::io::{BufRead, ErrorKind, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::models::MutationPolicy;
use crate::mutator::mutate;

/// Counters reported once a run ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub lines: usize,
    pub emitted: usize,
    /// Stopped early because of an interrupt
    pub interrupted: bool,
    /// Stopped early because the reader of our output went away
    pub sink_closed: bool,
}

/// Whether a run should keep going after a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    Continue,
    Stop,
}

/// Write one complete line. A closed pipe stops the run without an error.
///
/// The line and its newline go out in a single `write_all`, so a concurrent
/// holder of the stdout lock never observes half a URL.
pub(crate) fn emit<W: Write>(sink: &mut W, line: &str) -> Result<Flow> {
    let mut buf = String::with_capacity(line.len() + 1);
    buf.push_str(line);
    buf.push('\n');
    match sink.write_all(buf.as_bytes()) {
        Ok(()) => Ok(Flow::Continue),
        Err(e) if e.kind() == ErrorKind::BrokenPipe => Ok(Flow::Stop),
        Err(e) => Err(Error::Output(e)),
    }
}

/// Applies a fixed set of policies and payloads to every input line.
#[derive(Debug, Clone)]
pub struct MutationEngine {
    policies: Vec<MutationPolicy>,
    payloads: Vec<String>,
}

impl MutationEngine {
    pub fn new(policies: Vec<MutationPolicy>, payloads: Vec<String>) -> Self {
        Self { policies, payloads }
    }

    /// All mutations of one input line: payload order first, then policy
    /// order, then site order. Blank lines yield nothing.
    pub fn mutate_line(&self, line: &str) -> Vec<String> {
        let url = line.trim_end();
        if url.is_empty() {
            return Vec::new();
        }
        let mut out = Vec::new();
        for payload in &self.payloads {
            for policy in &self.policies {
                out.extend(mutate(url, payload, policy));
            }
        }
        out
    }

    /// Stream `input` to `sink` until EOF, a closed sink, or `cancel` is set.
    pub fn run<R: BufRead, W: Write>(
        &self,
        mut input: R,
        sink: &mut W,
        cancel: &AtomicBool,
    ) -> Result<RunStats> {
        let mut stats = RunStats::default();
        let mut raw = Vec::new();

        loop {
            if cancel.load(Ordering::SeqCst) {
                stats.interrupted = true;
                break;
            }
            raw.clear();
            let read = input.read_until(b'\n', &mut raw).map_err(Error::Input)?;
            if read == 0 {
                break;
            }
            stats.lines += 1;

            // Best effort: bytes that are not UTF-8 are replaced, not rejected
            let line = String::from_utf8_lossy(&raw);
            let mutations = self.mutate_line(&line);
            trace!(line = %line.trim_end(), outputs = mutations.len(), "mutated line");

            for url in &mutations {
                if cancel.load(Ordering::SeqCst) {
                    stats.interrupted = true;
                    return Ok(stats);
                }
                if emit(sink, url)? == Flow::Stop {
                    debug!("output closed, stopping");
                    stats.sink_closed = true;
                    return Ok(stats);
                }
                stats.emitted += 1;
            }
        }

        debug!(lines = stats.lines, emitted = stats.emitted, "input exhausted");
        Ok(stats)
    }
}
