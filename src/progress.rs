//! Progress bar for EEPROM transfers

use indicatif::{ProgressBar, ProgressStyle};
use rspd_core::eeprom::{TransferProgress, TransferStats};
use rspd_core::{Address, Block, Page};

/// indicatif progress bar fed by the transfer engine
pub struct IndicatifProgress {
    bar: Option<ProgressBar>,
    verb: &'static str,
    skipped_blocks: Vec<Block>,
}

impl IndicatifProgress {
    /// `verb` names the operation in the final message ("Read", "Write")
    pub fn new(verb: &'static str) -> Self {
        Self {
            bar: None,
            verb,
            skipped_blocks: Vec::new(),
        }
    }

    /// Blocks skipped because they were write protected
    pub fn skipped_blocks(&self) -> &[Block] {
        &self.skipped_blocks
    }
}

impl TransferProgress for IndicatifProgress {
    fn begin(&mut self, total: usize) {
        let pb = ProgressBar::new(total as u64);
        if let Ok(style) = ProgressStyle::default_bar().template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} bytes {msg}",
        ) {
            pb.set_style(style.progress_chars("#>-"));
        }
        self.bar = Some(pb);
    }

    fn page_selected(&mut self, page: Page) {
        if let Some(pb) = &self.bar {
            pb.set_message(format!("(page {})", page));
        }
    }

    fn transferred(&mut self, done: usize) {
        if let Some(pb) = &self.bar {
            pb.set_position(done as u64);
        }
    }

    fn skipped(&mut self, addr: Address) {
        let block = addr.block();
        if self.skipped_blocks.last() != Some(&block) {
            self.skipped_blocks.push(block);
        }
        if let Some(pb) = &self.bar {
            pb.inc(1);
        }
    }

    fn finish(&mut self, stats: &TransferStats) {
        if let Some(pb) = self.bar.take() {
            pb.finish_with_message(format!("{} complete", self.verb));
        }
        log::debug!(
            "{}: {} bytes transferred, {} skipped, {} page switches",
            self.verb,
            stats.transferred,
            stats.skipped,
            stats.page_switches
        );
    }
}
