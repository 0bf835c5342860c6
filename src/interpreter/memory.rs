use super::Interpreter;
use crate::alloc::BackingAllocator;
use crate::consts::{CMD_WORD_SIZE, MAX_MEM_REGIONS, REGION_ALIGN};
use crate::region::MemoryRegion;

use dse_asm::{Command, PanicReason, Word};
use tracing::debug;

impl<A> Interpreter<A>
where
    A: BackingAllocator,
{
    pub(crate) fn reserve(&mut self, cmd: &Command) -> Result<(), PanicReason> {
        if cmd.data_length() != 1 {
            return Err(PanicReason::MalformedCommand);
        }

        let region = (cmd.word().low_byte() & 0x1F) as usize;
        if region >= MAX_MEM_REGIONS {
            return Err(PanicReason::MalformedCommand);
        }
        if self.regions.get(region).is_some() {
            return Err(PanicReason::RegionInUse);
        }

        let unfilled = (cmd.word().low_byte() >> 7) & 1 == 1;
        let size = cmd
            .data(0)
            .checked_add(REGION_ALIGN - 1)
            .ok_or(PanicReason::OutOfMemory)?
            & !(REGION_ALIGN - 1);

        let start = self
            .allocator
            .alloc(size, self.launch.app_id)
            .ok_or(PanicReason::OutOfMemory)?;

        debug!(region, size, start, unfilled, "reserved memory region");
        self.regions.insert(region, MemoryRegion::new(start, size as usize, unfilled))
    }

    pub(crate) fn free(&mut self, cmd: &Command) -> Result<(), PanicReason> {
        let region = (cmd.word().low_byte() & 0x1F) as usize;
        let removed = self.regions.remove(region)?;
        self.allocator.free(removed.start_address());

        debug!(region, "freed memory region");
        Ok(())
    }
}

impl<A> Interpreter<A> {
    pub(crate) fn switch_focus(&mut self, cmd: &Command) -> Result<(), PanicReason> {
        let region = if cmd.src1_in_use() {
            self.registers[cmd.word().src1()] as usize
        } else {
            cmd.word().src1()
        };

        self.regions.switch_focus(region)
    }

    pub(crate) fn write(&mut self, cmd: &Command) -> Result<(), PanicReason> {
        let size = 1usize << ((cmd.word().0 >> 12) & 0x3);

        let repeats = if cmd.src2_in_use() {
            self.registers[cmd.word().src2()]
        } else {
            cmd.word().low_byte() as Word
        };

        let value = if cmd.src1_in_use() && cmd.data_length() == 0 {
            self.registers[cmd.word().src1()]
        } else if cmd.data_length() == 1 && size != 8 {
            cmd.data(0) as Word
        } else if cmd.data_length() == 2 && size == 8 {
            cmd.data_wide(0)
        } else {
            return Err(PanicReason::MalformedCommand);
        };

        let region = self.regions.focused_mut()?;
        for _ in 0..repeats {
            region.write_value(value, size)?;
        }
        Ok(())
    }

    /// Padded byte length of a `WRITE_ARRAY` inline payload; after the
    /// payload the program counter lands on the next word boundary.
    pub(crate) fn array_payload_len(cmd: &Command) -> Result<usize, PanicReason> {
        if cmd.data_length() < 1 {
            return Err(PanicReason::MalformedCommand);
        }

        let elem_size = cmd.word().low_byte() as usize;
        if !matches!(elem_size, 1 | 2 | 4 | 8) {
            return Err(PanicReason::InvalidDataSize);
        }

        let total = cmd.data(0) as usize * elem_size;
        Ok((total + CMD_WORD_SIZE - 1) & !(CMD_WORD_SIZE - 1))
    }

    pub(crate) fn write_array(&mut self, cmd: &Command) -> Result<(), PanicReason> {
        let padded = Self::array_payload_len(cmd)?;
        let total = cmd.data(0) as usize * cmd.word().low_byte() as usize;

        let payload = self
            .program
            .get(self.pc..self.pc + total)
            .ok_or(PanicReason::MalformedCommand)?
            .to_vec();

        self.regions.focused_mut()?.write_bytes(&payload)?;
        self.pc += padded;
        Ok(())
    }

    pub(crate) fn write_struct(&mut self, cmd: &Command) -> Result<(), PanicReason> {
        let id = cmd.word().low_nibble() as usize;

        let repeats = if cmd.src1_in_use() {
            self.registers[cmd.word().src1()]
        } else {
            ((cmd.word().0 >> 8) & 0xFF) as Word
        };

        let record = self.structs.get(id)?.clone();
        let region = self.regions.focused_mut()?;
        for _ in 0..repeats {
            for element in record.elements() {
                region.write_value(element.value(), element.ty().size())?;
            }
        }
        Ok(())
    }

    /// `memmove` between absolute addresses; both ranges must lie in
    /// allocated regions.
    pub(crate) fn block_copy(&mut self, cmd: &Command) -> Result<(), PanicReason> {
        let mut idx = 0;
        let dest = self.operand_or_field(cmd, cmd.dest_in_use(), cmd.word().dest(), &mut idx);
        let length = self.operand_or_field(cmd, cmd.src1_in_use(), cmd.word().src1(), &mut idx);
        let src = self.operand_or_field(cmd, cmd.src2_in_use(), cmd.word().src2(), &mut idx);

        let length = length as usize;
        if length == 0 {
            return Ok(());
        }

        let src = u32::try_from(src).map_err(|_| PanicReason::AddressNotMapped)?;
        let dest = u32::try_from(dest).map_err(|_| PanicReason::AddressNotMapped)?;

        // staging through an owned buffer keeps overlapping ranges safe
        let bytes = self.regions.read_absolute(src, length)?;
        self.regions.write_absolute(dest, &bytes)
    }

    pub(crate) fn read(&mut self, cmd: &Command) -> Result<(), PanicReason> {
        let size = cmd.word().low_byte() as usize;
        if !matches!(size, 1 | 2 | 4 | 8) {
            return Err(PanicReason::InvalidDataSize);
        }

        let value = self.regions.focused_mut()?.read_value(size)?;
        self.registers[cmd.word().dest()] = value;
        Ok(())
    }

    pub(crate) fn get_wr_ptr(&mut self, cmd: &Command) -> Result<(), PanicReason> {
        let offset = self.regions.focused()?.write_offset();
        self.registers[cmd.word().dest()] = offset as Word;
        Ok(())
    }

    pub(crate) fn set_wr_ptr(&mut self, cmd: &Command) -> Result<(), PanicReason> {
        let relative = cmd.word().0 & 1 == 1;

        let value = if cmd.src1_in_use() {
            self.registers[cmd.word().src1()]
        } else if cmd.data_length() >= 1 {
            let raw = cmd.data(0);
            if relative {
                // adjustments are signed
                raw as i32 as i64 as Word
            } else {
                raw as Word
            }
        } else {
            return Err(PanicReason::MalformedCommand);
        };

        let region = self.regions.focused_mut()?;
        let target = if relative {
            (region.write_offset() as Word).wrapping_add(value)
        } else {
            value
        };

        if target > region.size() as Word {
            return Err(PanicReason::RegionOverflow);
        }
        region.set_write_offset(target as usize)
    }

    pub(crate) fn reset_wr_ptr(&mut self) -> Result<(), PanicReason> {
        self.regions.focused_mut()?.set_write_offset(0)
    }

    pub(crate) fn align_wr_ptr(&mut self, cmd: &Command) -> Result<(), PanicReason> {
        let power = if cmd.src1_in_use() {
            self.registers[cmd.word().src1()]
        } else {
            (cmd.word().0 & 0x1F) as Word
        };
        if power >= 32 {
            return Err(PanicReason::ArithmeticError);
        }

        let block = 1usize << power;
        let region = self.regions.focused_mut()?;
        let aligned = (region.write_offset() + block - 1) & !(block - 1);
        region.set_write_offset(aligned)?;
        let absolute = region.start_address() as Word + aligned as Word;

        if cmd.dest_in_use() {
            self.registers[cmd.word().dest()] = absolute;
        }
        Ok(())
    }
}
