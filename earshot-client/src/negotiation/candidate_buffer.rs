/// Remote ICE candidates that arrived before the remote description.
///
/// Candidates are released in arrival order once the description is applied,
/// and pass straight through afterwards.
#[derive(Debug, Default)]
pub struct CandidateBuffer {
    pending: Vec<String>,
    remote_applied: bool,
}

impl CandidateBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the candidate back if it can be applied right away.
    pub fn push(&mut self, candidate: String) -> Option<String> {
        if self.remote_applied {
            return Some(candidate);
        }
        self.pending.push(candidate);
        None
    }

    /// Marks the remote description as applied and drains what was held.
    pub fn release(&mut self) -> Vec<String> {
        self.remote_applied = true;
        std::mem::take(&mut self.pending)
    }

    pub fn is_remote_applied(&self) -> bool {
        self.remote_applied
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}
