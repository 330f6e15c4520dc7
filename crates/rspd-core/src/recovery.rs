//! Failure recovery
//!
//! The hub keeps its page selection across transactions. If an operation
//! dies while a page other than 0 is selected, the next program to touch the
//! bus (including the BIOS on the next boot) may address the wrong 128-byte
//! window. To limit the damage, every failed transaction is followed by one
//! attempt to reselect page 0 before the failure is reported.
//!
//! The page state lives in a [`RecoveryContext`] owned by the operation in
//! progress. It is created when the operation starts and dropped when it
//! ends; nothing persists between operations.

use crate::bus::{BusError, SmbusMaster};
use crate::error::{Error, Recovery};
use crate::protocol;
use crate::regs;
use crate::types::{ChipAddress, Page};

/// What this operation knows about the hub's page selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageState {
    /// No page select has been issued by this operation
    Untouched,
    /// The last page select succeeded
    Selected(Page),
    /// A page select was issued but did not complete
    Unknown,
}

/// Call-scoped recovery state for one hub
#[derive(Debug, Clone, Copy)]
pub struct RecoveryContext {
    chip: ChipAddress,
    state: PageState,
}

impl RecoveryContext {
    /// Start tracking a hub that is assumed to sit on page 0
    pub const fn new(chip: ChipAddress) -> Self {
        Self {
            chip,
            state: PageState::Untouched,
        }
    }

    /// The hub this context belongs to
    pub const fn chip(&self) -> ChipAddress {
        self.chip
    }

    /// Current page state
    pub const fn state(&self) -> PageState {
        self.state
    }

    /// The page known to be selected, if any
    pub fn selected(&self) -> Option<Page> {
        match self.state {
            PageState::Selected(page) => Some(page),
            _ => None,
        }
    }

    /// Whether the hub may be on a page other than 0
    pub fn away_from_first_page(&self) -> bool {
        match self.state {
            PageState::Untouched => false,
            PageState::Selected(page) => page != Page::FIRST,
            PageState::Unknown => true,
        }
    }

    pub(crate) fn mark_unknown(&mut self) {
        self.state = PageState::Unknown;
    }

    pub(crate) fn mark_selected(&mut self, page: Page) {
        self.state = PageState::Selected(page);
    }
}

/// Turn a failed transaction into a fatal error, restoring page 0 if needed
///
/// At most one recovery transaction is issued. The original failure is
/// always reported; recovery only decides how bad the situation is.
pub fn recover<M: SmbusMaster + ?Sized>(
    master: &mut M,
    ctx: &mut RecoveryContext,
    cause: BusError,
) -> Error {
    log::error!("spd {}: {}, aborting", ctx.chip, cause);

    let recovery = if ctx.away_from_first_page() {
        master.delay_ms(regs::SETTLE_MS);
        match protocol::write_register(master, ctx.chip, regs::PAGE_SELECT, Page::FIRST.get()) {
            Ok(()) => {
                ctx.mark_selected(Page::FIRST);
                log::warn!("spd {}: page 0 reselected after failure", ctx.chip);
                Recovery::Restored
            }
            Err(e) => {
                ctx.mark_unknown();
                log::error!("spd {}: EEPROM page is NOT restored to 0 ({})", ctx.chip, e);
                Recovery::Failed(e)
            }
        }
    } else {
        Recovery::NotAttempted
    };

    Error::FatalIo { cause, recovery }
}

/// Run one transaction, escalating any failure through [`recover`]
pub fn guarded<M, T, F>(master: &mut M, ctx: &mut RecoveryContext, op: F) -> Result<T, Error>
where
    M: SmbusMaster + ?Sized,
    F: FnOnce(&mut M) -> Result<T, BusError>,
{
    match op(master) {
        Ok(value) => Ok(value),
        Err(cause) => Err(recover(master, ctx, cause)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testbus::{Op, TestBus};

    fn chip() -> ChipAddress {
        ChipAddress::new(0x51).unwrap()
    }

    #[test]
    fn test_no_recovery_on_first_page() {
        let mut bus = TestBus::new();
        let mut ctx = RecoveryContext::new(chip());
        let err = recover(&mut bus, &mut ctx, BusError::Timeout);
        assert_eq!(
            err,
            Error::FatalIo {
                cause: BusError::Timeout,
                recovery: Recovery::NotAttempted
            }
        );
        assert!(!err.recovered());
        assert!(bus.ops().is_empty());
    }

    #[test]
    fn test_recovery_restores_first_page() {
        let mut bus = TestBus::new();
        let mut ctx = RecoveryContext::new(chip());
        ctx.mark_selected(Page::new(3).unwrap());

        let err = recover(&mut bus, &mut ctx, BusError::Status(2));
        assert!(err.recovered());
        assert_eq!(bus.ops(), &[Op::Write(regs::PAGE_SELECT, 0)]);
        assert_eq!(ctx.selected(), Some(Page::FIRST));
        // Settle before and after the recovery write
        assert_eq!(bus.delays(), 2);
    }

    #[test]
    fn test_recovery_failure_is_reported() {
        let mut bus = TestBus::new();
        bus.fail_writes(BusError::Timeout);
        let mut ctx = RecoveryContext::new(chip());
        ctx.mark_unknown();

        let err = recover(&mut bus, &mut ctx, BusError::Malformed);
        assert_eq!(
            err,
            Error::FatalIo {
                cause: BusError::Malformed,
                recovery: Recovery::Failed(BusError::Timeout)
            }
        );
        assert_eq!(bus.ops().len(), 1);
        assert!(ctx.away_from_first_page());
    }

    #[test]
    fn test_guarded_passes_success_through() {
        let mut bus = TestBus::new();
        bus.set_register(0x80, 0x5a);
        let mut ctx = RecoveryContext::new(chip());
        let value = guarded(&mut bus, &mut ctx, |m| m.read_byte_data(chip(), 0x80));
        assert_eq!(value, Ok(0x5a));
    }
}
