use super::Interpreter;
use crate::consts::MAX_STRUCTS;
use crate::structs::{Struct, StructElement};

use dse_asm::{Command, DataType, Opcode, PanicReason, Word};

impl<A> Interpreter<A> {
    /// Consume a `START_STRUCT .. END_STRUCT` definition, installing
    /// the record in its slot. Slots may be redefined.
    pub(crate) fn start_struct(&mut self, cmd: &Command) -> Result<(), PanicReason> {
        let id = (cmd.word().low_byte() & 0x1F) as usize;
        let mut record = Struct::new();

        loop {
            if self.pc >= self.program.len() {
                return Err(PanicReason::UnbalancedBlock);
            }

            let elem = self.fetch()?;
            match elem.word().opcode()? {
                Opcode::StructElem => {
                    let ty = DataType::try_from(elem.word().low_byte())?;
                    let value = match elem.data_length() {
                        0 => 0,
                        1 => elem.data(0) as Word,
                        2 => elem.data_wide(0),
                        _ => return Err(PanicReason::MalformedCommand),
                    };
                    record.push(StructElement::new(ty, value))?;
                }
                Opcode::EndStruct => break,
                // struct definitions hold nothing but elements
                _ => return Err(PanicReason::MalformedCommand),
            }
        }

        self.structs.set(id, record)
    }

    pub(crate) fn write_param(&mut self, cmd: &Command) -> Result<(), PanicReason> {
        let struct_id = cmd.word().dest();
        let elem_id = cmd.word().low_byte() as usize;

        let value = if cmd.src1_in_use() {
            self.registers[cmd.word().src1()]
        } else {
            match cmd.data_length() {
                1 => cmd.data(0) as Word,
                2 => cmd.data_wide(0),
                _ => return Err(PanicReason::MalformedCommand),
            }
        };

        self.structs.get_mut(struct_id)?.element_mut(elem_id)?.set(value);
        Ok(())
    }

    pub(crate) fn read_param(&mut self, cmd: &Command) -> Result<(), PanicReason> {
        let struct_id = cmd.word().low_nibble() as usize;

        let elem_id = if cmd.src1_in_use() {
            self.registers[cmd.word().src1()] as usize
        } else {
            ((cmd.word().0 >> 4) & 0xFF) as usize
        };

        let value = self.structs.get(struct_id)?.element(elem_id)?.value();
        self.registers[cmd.word().dest()] = value;
        Ok(())
    }

    pub(crate) fn copy_param(&mut self, cmd: &Command) -> Result<(), PanicReason> {
        if cmd.data_length() != 1 {
            return Err(PanicReason::MalformedCommand);
        }

        let src_struct = cmd.word().src1();
        let src_elem = (cmd.data(0) & 0xFF) as usize;
        let value = self.structs.get(src_struct)?.element(src_elem)?.value();

        if cmd.dest_in_use() {
            self.registers[cmd.word().dest()] = value;
        } else {
            let dest_struct = cmd.word().dest();
            let dest_elem = ((cmd.data(0) >> 8) & 0xFF) as usize;
            // the destination element keeps its own type and mask
            self.structs.get_mut(dest_struct)?.element_mut(dest_elem)?.set(value);
        }
        Ok(())
    }

    pub(crate) fn copy_struct(&mut self, cmd: &Command) -> Result<(), PanicReason> {
        let dest = if cmd.dest_in_use() {
            self.registers[cmd.word().dest()] as usize
        } else {
            cmd.word().dest()
        };
        let src = if cmd.src1_in_use() {
            self.registers[cmd.word().src1()] as usize
        } else {
            cmd.word().src1()
        };

        if dest >= MAX_STRUCTS {
            return Err(PanicReason::StructNotDeclared);
        }

        let copy = self.structs.get(src)?.clone();
        self.structs.set(dest, copy)
    }
}
