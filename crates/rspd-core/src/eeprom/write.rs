//! Ranged image write

use super::{teardown, TransferProgress, TransferStats};
use crate::bus::SmbusMaster;
use crate::error::Result;
use crate::page;
use crate::protocol;
use crate::range::RangeSet;
use crate::recovery::{guarded, RecoveryContext};
use crate::rswp::{self, RswpMap};
use crate::spd::SpdImage;
use crate::types::{Block, ChipAddress};

/// Write the addresses selected by `ranges` from `image` to `chip`
///
/// The protection bitmap is read once up front. Addresses inside a
/// protected block are skipped without any bus transaction. Any failure
/// aborts the remaining ranges.
pub fn write<M, P>(
    master: &mut M,
    chip: ChipAddress,
    image: &SpdImage,
    ranges: &RangeSet,
    progress: &mut P,
) -> Result<TransferStats>
where
    M: SmbusMaster + ?Sized,
    P: TransferProgress + ?Sized,
{
    let mut ctx = RecoveryContext::new(chip);
    let mut stats = TransferStats::default();

    progress.begin(ranges.len());
    log::info!("spd {}: writing {} bytes ({})", chip, ranges.len(), ranges);

    let result = write_pass(master, &mut ctx, image, ranges, progress, &mut stats);
    teardown(master, &mut ctx, result)?;

    progress.finish(&stats);
    Ok(stats)
}

fn write_pass<M, P>(
    master: &mut M,
    ctx: &mut RecoveryContext,
    image: &SpdImage,
    ranges: &RangeSet,
    progress: &mut P,
    stats: &mut TransferStats,
) -> Result<()>
where
    M: SmbusMaster + ?Sized,
    P: TransferProgress + ?Sized,
{
    let chip = ctx.chip();
    let protected: RswpMap = rswp::get_all_in(master, ctx)?;
    let mut last_skipped: Option<Block> = None;

    for addr in ranges.addresses() {
        let block = addr.block();
        if protected.is_protected(block) {
            if last_skipped != Some(block) {
                log::warn!("spd {}: block {} is write protected, skipping", chip, block);
                last_skipped = Some(block);
            }
            stats.skipped += 1;
            progress.skipped(addr);
            progress.transferred(stats.transferred + stats.skipped);
            continue;
        }

        if ctx.selected() != Some(addr.page()) {
            page::select_page(master, ctx, addr.page())?;
            stats.page_switches += 1;
            progress.page_selected(addr.page());
        }

        let value = image.get(addr);
        guarded(master, ctx, |m| {
            protocol::write_register(m, chip, addr.data_register(), value)
        })?;
        stats.transferred += 1;
        progress.transferred(stats.transferred + stats.skipped);
    }

    Ok(())
}
