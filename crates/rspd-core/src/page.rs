//! Page selection
//!
//! Maps logical EEPROM addresses onto the hub's 128-byte data window and
//! switches the window. The page the hub is on is tracked in the caller's
//! [`RecoveryContext`] so a later failure knows whether recovery is needed.

use crate::bus::SmbusMaster;
use crate::error::Result;
use crate::protocol;
use crate::recovery::{guarded, RecoveryContext};
use crate::regs;
use crate::types::Page;

/// Select `page` as the hub's active data window
///
/// The context is marked unknown while the write is in flight, so a failed
/// page select always triggers recovery.
pub fn select_page<M: SmbusMaster + ?Sized>(
    master: &mut M,
    ctx: &mut RecoveryContext,
    page: Page,
) -> Result<()> {
    log::debug!("spd {}: selecting page {}", ctx.chip(), page);
    let chip = ctx.chip();
    let previous = ctx.state();
    if ctx.selected() != Some(page) {
        ctx.mark_unknown();
    }
    guarded(master, ctx, |m| {
        protocol::write_register(m, chip, regs::PAGE_SELECT, page.get())
    })?;
    ctx.mark_selected(page);
    log::trace!("spd {}: page state {:?} -> {:?}", chip, previous, ctx.state());
    Ok(())
}

/// Select page 0 at the end of an operation
pub fn release<M: SmbusMaster + ?Sized>(master: &mut M, ctx: &mut RecoveryContext) -> Result<()> {
    select_page(master, ctx, Page::FIRST)
}
