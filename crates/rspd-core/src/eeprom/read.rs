//! Full image read

use super::{teardown, TransferProgress, TransferStats};
use crate::bus::SmbusMaster;
use crate::error::Result;
use crate::page;
use crate::protocol;
use crate::recovery::{guarded, RecoveryContext};
use crate::regs;
use crate::spd::SpdImage;
use crate::types::{Address, ChipAddress};

/// Read the complete EEPROM of `chip`
///
/// Every address is read; write protection does not restrict reads. On
/// failure nothing read so far is returned.
pub fn read<M, P>(master: &mut M, chip: ChipAddress, progress: &mut P) -> Result<SpdImage>
where
    M: SmbusMaster + ?Sized,
    P: TransferProgress + ?Sized,
{
    let mut ctx = RecoveryContext::new(chip);
    let mut stats = TransferStats::default();

    progress.begin(regs::EEPROM_SIZE);
    log::info!("spd {}: reading {} bytes", chip, regs::EEPROM_SIZE);

    let result = read_pass(master, &mut ctx, progress, &mut stats);
    let image = teardown(master, &mut ctx, result)?;

    progress.finish(&stats);
    Ok(image)
}

fn read_pass<M, P>(
    master: &mut M,
    ctx: &mut RecoveryContext,
    progress: &mut P,
    stats: &mut TransferStats,
) -> Result<SpdImage>
where
    M: SmbusMaster + ?Sized,
    P: TransferProgress + ?Sized,
{
    let chip = ctx.chip();
    let mut image = SpdImage::zeroed();

    for addr in Address::all() {
        if addr.is_page_start() {
            page::select_page(master, ctx, addr.page())?;
            stats.page_switches += 1;
            progress.page_selected(addr.page());
        }
        let value = guarded(master, ctx, |m| {
            protocol::read_register(m, chip, addr.data_register())
        })?;
        image.set(addr, value);
        stats.transferred += 1;
        progress.transferred(stats.transferred);
    }

    Ok(image)
}
