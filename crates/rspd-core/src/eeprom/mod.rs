//! Whole-image transfers
//!
//! [`read`] dumps all 1024 bytes; [`write`] programs a selection of
//! addresses, leaving write protected blocks untouched. Both walk addresses
//! in ascending order, switch pages only when the page changes, and end on
//! page 0 whatever happens:
//!
//! - on success the hub is explicitly returned to page 0
//! - on a failure away from page 0, recovery already reselects it
//! - on a failure while still on page 0, a best-effort teardown select is
//!   issued; its outcome does not change the reported error

mod progress;
mod read;
mod write;

pub use progress::{NoProgress, TransferProgress, TransferStats};
pub use read::read;
pub use write::write;

use crate::bus::SmbusMaster;
use crate::error::{Error, Recovery, Result};
use crate::page;
use crate::protocol;
use crate::recovery::RecoveryContext;
use crate::regs;
use crate::types::Page;

/// Return the hub to page 0 after a pass, passing the pass result through
fn teardown<M, T>(master: &mut M, ctx: &mut RecoveryContext, result: Result<T>) -> Result<T>
where
    M: SmbusMaster + ?Sized,
{
    match result {
        Ok(value) => {
            page::release(master, ctx)?;
            Ok(value)
        }
        Err(err @ Error::FatalIo {
            recovery: Recovery::NotAttempted,
            ..
        }) => {
            let chip = ctx.chip();
            match protocol::write_register(master, chip, regs::PAGE_SELECT, Page::FIRST.get()) {
                Ok(()) => log::debug!("spd {}: page 0 selected after failed pass", chip),
                Err(e) => log::warn!("spd {}: teardown page select failed: {}", chip, e),
            }
            Err(err)
        }
        Err(err) => Err(err),
    }
}
