use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct LogLine {
    pub seq: u64,
    pub text: String,
}

/// Append-only log of worker output and server responses.
///
/// Lines are never dropped, truncated, or persisted; the buffer lives as
/// long as the controller that owns it. All mutation happens on the single
/// task driving the controller, so no interior locking is needed.
#[derive(Debug, Default)]
pub struct LogBuffer {
    seq: u64,
    lines: Vec<LogLine>,
}

impl LogBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, text: impl Into<String>) -> u64 {
        self.seq += 1;
        self.lines.push(LogLine {
            seq: self.seq,
            text: text.into(),
        });
        self.seq
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn last(&self) -> Option<&LogLine> {
        self.lines.last()
    }

    pub fn snapshot(&self, last_n: usize) -> Vec<LogLine> {
        let start = self.lines.len().saturating_sub(last_n);
        self.lines[start..].to_vec()
    }

    pub fn since(&self, seq: u64) -> Vec<LogLine> {
        self.lines.iter().filter(|l| l.seq > seq).cloned().collect()
    }
}
