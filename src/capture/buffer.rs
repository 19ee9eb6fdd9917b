/// Ordered buffer of finalized utterances for one capture activation.
///
/// Append-only while capture is active; flushing joins the fragments with
/// single spaces and trims the result, and empties the buffer so it is never
/// read across two activations.
#[derive(Debug, Default)]
pub struct TranscriptBuffer {
    fragments: Vec<String>,
}

impl TranscriptBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_final(&mut self, fragment: impl Into<String>) {
        self.fragments.push(fragment.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    /// Drain the buffer into a single answer string. Returns `None` when
    /// nothing but whitespace was captured.
    pub fn flush(&mut self) -> Option<String> {
        let joined = self.fragments.join(" ");
        self.fragments.clear();
        let trimmed = joined.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    /// Discard everything without producing an answer.
    pub fn clear(&mut self) {
        self.fragments.clear();
    }
}
