//! Reusable encoded-frame buffer.
//!
//! The dispatch loop owns exactly one `FrameBuffer` and refills it every
//! cycle. `reset()` clears the contents without releasing capacity, so the
//! steady state allocates nothing per frame. A frame never outlives the
//! cycle that captured it; the one exception is persistence/transmission,
//! which goes through `snapshot()` - an explicit by-copy handoff.

use std::time::SystemTime;

pub struct FrameBuffer {
    data: Vec<u8>,
    captured_at: SystemTime,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            captured_at: SystemTime::UNIX_EPOCH,
        }
    }

    /// Replace the buffer contents with a freshly captured frame and stamp
    /// the capture time. Called only by the capture layer.
    pub fn refill(&mut self, encoded: &[u8]) {
        self.data.clear();
        self.data.extend_from_slice(encoded);
        self.captured_at = SystemTime::now();
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn captured_at(&self) -> SystemTime {
        self.captured_at
    }

    /// Copy the frame out for a collaborator that persists or transmits it.
    pub fn snapshot(&self) -> Vec<u8> {
        self.data.clone()
    }

    /// Clear the buffer for the next cycle, keeping its capacity.
    pub fn reset(&mut self) {
        self.data.clear();
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refill_replaces_contents() {
        let mut frame = FrameBuffer::new();
        frame.refill(b"first");
        assert_eq!(frame.as_bytes(), b"first");

        frame.refill(b"second frame");
        assert_eq!(frame.as_bytes(), b"second frame");
    }

    #[test]
    fn reset_keeps_capacity() {
        let mut frame = FrameBuffer::new();
        frame.refill(&[0u8; 4096]);
        let capacity = frame.data.capacity();

        frame.reset();
        assert!(frame.is_empty());
        assert_eq!(frame.data.capacity(), capacity);
    }

    #[test]
    fn snapshot_is_an_independent_copy() {
        let mut frame = FrameBuffer::new();
        frame.refill(b"payload");
        let copy = frame.snapshot();

        frame.reset();
        assert_eq!(copy, b"payload");
    }
}
