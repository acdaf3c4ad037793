// src/pipeline/sequence.rs
//! Per-session sequence numbers

/// Gapless counter handing out 1, 2, 3, … until reset
#[derive(Debug, Default)]
pub struct SequenceCounter {
    last: u64,
}

impl SequenceCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the next sequence number
    pub fn next(&mut self) -> u64 {
        self.last += 1;
        self.last
    }

    /// Last number handed out (0 before the first claim)
    pub fn current(&self) -> u64 {
        self.last
    }

    pub fn reset(&mut self) {
        self.last = 0;
    }
}
