//! Transfer progress reporting

use crate::types::{Address, Page};

/// Statistics from a completed transfer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferStats {
    /// Bytes read or written over the bus
    pub transferred: usize,
    /// Bytes skipped because their block is write protected
    pub skipped: usize,
    /// Page select transactions issued, teardown excluded
    pub page_switches: usize,
}

/// Progress callback for [`read`](super::read) and [`write`](super::write)
pub trait TransferProgress {
    /// Called before the first transaction with the number of addresses
    /// the pass will visit
    fn begin(&mut self, total: usize);

    /// Called after the hub switched to `page`
    fn page_selected(&mut self, page: Page);

    /// Called after each byte transfer with the running count of visited
    /// addresses (transferred and skipped)
    fn transferred(&mut self, done: usize);

    /// Called for each address skipped because its block is protected
    fn skipped(&mut self, addr: Address);

    /// Called once the pass and its teardown completed
    fn finish(&mut self, stats: &TransferStats);
}

/// A no-op progress reporter
pub struct NoProgress;

impl TransferProgress for NoProgress {
    fn begin(&mut self, _total: usize) {}
    fn page_selected(&mut self, _page: Page) {}
    fn transferred(&mut self, _done: usize) {}
    fn skipped(&mut self, _addr: Address) {}
    fn finish(&mut self, _stats: &TransferStats) {}
}
