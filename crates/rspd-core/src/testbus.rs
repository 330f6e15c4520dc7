//! Recording bus for unit tests

use std::vec::Vec;

use crate::bus::{BusError, SmbusMaster};
use crate::types::ChipAddress;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Read(u8),
    Write(u8, u8),
}

pub struct TestBus {
    regs: [u8; 256],
    ops: Vec<Op>,
    delays: usize,
    fail_writes: Option<BusError>,
    fail_at: Option<(usize, BusError)>,
}

impl TestBus {
    pub fn new() -> Self {
        Self {
            regs: [0; 256],
            ops: Vec::new(),
            delays: 0,
            fail_writes: None,
            fail_at: None,
        }
    }

    pub fn set_register(&mut self, reg: u8, value: u8) {
        self.regs[reg as usize] = value;
    }

    pub fn register(&self, reg: u8) -> u8 {
        self.regs[reg as usize]
    }

    /// Make every write fail
    pub fn fail_writes(&mut self, err: BusError) {
        self.fail_writes = Some(err);
    }

    /// Make the transaction with index `n` (0-based) fail
    pub fn fail_at(&mut self, n: usize, err: BusError) {
        self.fail_at = Some((n, err));
    }

    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    pub fn writes(&self) -> usize {
        self.ops.iter().filter(|op| matches!(op, Op::Write(..))).count()
    }

    pub fn delays(&self) -> usize {
        self.delays
    }

    fn scripted_failure(&self) -> Option<BusError> {
        match self.fail_at {
            Some((n, err)) if n + 1 == self.ops.len() => Some(err),
            _ => None,
        }
    }
}

impl SmbusMaster for TestBus {
    fn read_byte_data(&mut self, _chip: ChipAddress, reg: u8) -> Result<u8, BusError> {
        self.ops.push(Op::Read(reg));
        if let Some(err) = self.scripted_failure() {
            return Err(err);
        }
        Ok(self.regs[reg as usize])
    }

    fn write_byte_data(&mut self, _chip: ChipAddress, reg: u8, value: u8) -> Result<(), BusError> {
        self.ops.push(Op::Write(reg, value));
        if let Some(err) = self.scripted_failure().or(self.fail_writes) {
            return Err(err);
        }
        self.regs[reg as usize] = value;
        Ok(())
    }

    fn delay_ms(&mut self, _ms: u32) {
        self.delays += 1;
    }
}
