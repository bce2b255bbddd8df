//! Rotary encoder position tracking.
//!
//! The quadrature counter (hardware or simulated) reports an absolute,
//! monotonically tracked position.  The tracker turns that into a signed
//! per-tick delta.  Wrapping arithmetic keeps the delta correct across a
//! counter rollover.

pub struct EncoderTracker {
    last: Option<i32>,
}

impl EncoderTracker {
    pub fn new() -> Self {
        Self { last: None }
    }

    /// Detents moved since the previous call.  The first reading primes
    /// the tracker and yields zero.
    pub fn delta(&mut self, position: i32) -> i32 {
        let delta = match self.last {
            Some(prev) => position.wrapping_sub(prev),
            None => 0,
        };
        self.last = Some(position);
        delta
    }
}

impl Default for EncoderTracker {
    fn default() -> Self {
        Self::new()
    }
}
