//! Progress reporting for block transfers.

/// Receives progress of a transfer.
///
/// `total` counts frames, including the trailing empty block when there is
/// one. Each `increment` reports the payload bytes of one accepted block.
pub trait Progress {
    /// Called once, before the first frame, with the number of data frames.
    fn set_total(&mut self, blocks: usize);

    /// Called after each accepted data frame.
    fn increment(&mut self, bytes: usize);

    /// Called once after the last frame was accepted.
    fn finish(&mut self);
}

/// Progress sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn set_total(&mut self, _blocks: usize) {}

    fn increment(&mut self, _bytes: usize) {}

    fn finish(&mut self) {}
}
