use super::Interpreter;
use crate::alloc::{BackingAllocator, BumpAllocator};
use crate::call::CallStack;
use crate::consts::*;
use crate::error::InterpreterError;
use crate::region::RegionTable;
use crate::structs::StructTable;

/// Launch parameters handed to the executor by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LaunchRecord {
    /// Opaque application tag attached to every allocation.
    pub app_id: u8,
    /// Whether a memory-map report should be produced next to the
    /// pointer table.
    pub generate_report: bool,
}

impl LaunchRecord {
    pub const fn new(app_id: u8, generate_report: bool) -> Self {
        Self {
            app_id,
            generate_report,
        }
    }
}

impl<A> Interpreter<A>
where
    A: BackingAllocator,
{
    pub fn new(allocator: A, launch: LaunchRecord) -> Self {
        Self {
            registers: [0; VM_REGISTER_COUNT],
            program: Vec::new(),
            pc: 0,
            regions: RegionTable::new(),
            structs: StructTable::new(),
            constructors: [None; MAX_CONSTRUCTORS],
            stack: CallStack::new(),
            receipts: Vec::new(),
            allocator,
            launch,
        }
    }
}

impl Interpreter<BumpAllocator> {
    /// Interpreter over an in-memory bump allocator with default launch
    /// parameters.
    pub fn in_memory() -> Self {
        Self::new(BumpAllocator::default(), LaunchRecord::default())
    }
}

impl<A> Interpreter<A> {
    /// Install a program, validating alignment and stripping an
    /// optional data-specification file header.
    pub(crate) fn load(&mut self, spec: &[u8]) -> Result<(), InterpreterError> {
        if spec.len() % CMD_WORD_SIZE != 0 {
            return Err(InterpreterError::ProgramNotWordAligned(spec.len()));
        }

        let mut body = spec;
        if spec.len() >= 2 * CMD_WORD_SIZE {
            let magic = u32::from_le_bytes(spec[..4].try_into().unwrap_or_else(|_| unreachable!()));
            if magic == DSG_MAGIC_NUM {
                let version = u32::from_le_bytes(spec[4..8].try_into().unwrap_or_else(|_| unreachable!()));
                if version != DSE_VERSION {
                    return Err(InterpreterError::VersionMismatch(version));
                }
                body = &spec[2 * CMD_WORD_SIZE..];
            }
        }

        self.program = body.to_vec();
        self.pc = 0;
        Ok(())
    }
}
