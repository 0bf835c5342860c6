//! [`Interpreter`] implementation.

use crate::call::{CallStack, Constructor};
use crate::consts::*;
use crate::region::{MemoryRegion, RegionTable};
use crate::structs::StructTable;

use dse_asm::Word;

mod alu;
mod executors;
mod flow;
mod initialization;
mod log;
mod memory;
mod structs;

pub use initialization::LaunchRecord;
pub use log::Receipt;

#[derive(Debug, Clone)]
/// Data specification interpreter.
///
/// Owns the register file, the region, struct and constructor tables
/// and the call stack for the lifetime of one program. After a
/// successful run the pointer table and region report are read off the
/// interpreter (see the `output` module).
pub struct Interpreter<A> {
    registers: [Word; VM_REGISTER_COUNT],
    program: Vec<u8>,
    pc: usize,
    regions: RegionTable,
    structs: StructTable,
    constructors: [Option<Constructor>; MAX_CONSTRUCTORS],
    stack: CallStack,
    receipts: Vec<Receipt>,
    allocator: A,
    launch: LaunchRecord,
}

impl<A> Interpreter<A> {
    /// Returns the current state of the registers.
    pub const fn registers(&self) -> &[Word] {
        &self.registers
    }

    /// Receipts generated by the diagnostics opcodes.
    pub fn receipts(&self) -> &[Receipt] {
        self.receipts.as_slice()
    }

    /// The region held in slot `id`, if any.
    pub fn region(&self, id: usize) -> Option<&MemoryRegion> {
        self.regions.get(id)
    }

    /// The focused region slot, if any `SWITCH_FOCUS` ran.
    pub const fn current_region(&self) -> Option<usize> {
        self.regions.current()
    }

    /// The launch record this interpreter was initialised with.
    pub const fn launch(&self) -> &LaunchRecord {
        &self.launch
    }

    /// Value of one struct element, if the slot and element exist.
    pub fn struct_element(&self, id: usize, elem: usize) -> Option<Word> {
        self.structs
            .get(id)
            .ok()
            .and_then(|s| s.element(elem).ok())
            .map(|e| e.value())
    }

    pub(crate) const fn regions(&self) -> &RegionTable {
        &self.regions
    }
}

impl<A> AsRef<A> for Interpreter<A> {
    fn as_ref(&self) -> &A {
        &self.allocator
    }
}

impl<A> AsMut<A> for Interpreter<A> {
    fn as_mut(&mut self) -> &mut A {
        &mut self.allocator
    }
}
