use super::Interpreter;
use crate::consts::MAX_PRINT_TEXT;

use dse_asm::{Command, DataType, PanicReason, Word};

use itertools::Itertools;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Diagnostics record appended by the print opcodes.
///
/// Prints also go to the log sink; the receipts keep them observable
/// for embedders and tests.
pub enum Receipt {
    Value {
        value: Word,
    },
    Text {
        text: String,
    },
    Struct {
        id: usize,
        elements: Vec<(DataType, Word)>,
    },
}

impl<A> Interpreter<A> {
    pub(crate) fn print_val(&mut self, cmd: &Command) -> Result<(), PanicReason> {
        let value = if cmd.src1_in_use() {
            self.registers[cmd.word().src1()]
        } else {
            match cmd.data_length() {
                1 => cmd.data(0) as Word,
                2 => cmd.data_wide(0),
                _ => return Err(PanicReason::MalformedCommand),
            }
        };

        info!("{value:016X}");
        self.receipts.push(Receipt::Value { value });
        Ok(())
    }

    pub(crate) fn print_txt(&mut self, cmd: &Command) -> Result<(), PanicReason> {
        let encoded = cmd.word().low_byte() as usize;
        if encoded >= MAX_PRINT_TEXT {
            return Err(PanicReason::TextTooLong);
        }

        let count = encoded + 1;
        if cmd.data_length() * 4 < count {
            return Err(PanicReason::MalformedCommand);
        }

        let bytes: Vec<u8> = (0..cmd.data_length())
            .flat_map(|i| cmd.data(i).to_le_bytes())
            .take(count)
            .collect();
        let text = String::from_utf8_lossy(&bytes).into_owned();

        info!("{text}");
        self.receipts.push(Receipt::Text { text });
        Ok(())
    }

    pub(crate) fn print_struct(&mut self, cmd: &Command) -> Result<(), PanicReason> {
        let id = cmd.word().low_nibble() as usize;

        let elements: Vec<(DataType, Word)> = self
            .structs
            .get(id)?
            .elements()
            .map(|e| (e.ty(), e.value()))
            .collect();

        let rendered = elements.iter().map(|(_, v)| format!("{v:X}")).join(", ");
        info!("struct {id}: {rendered}");

        self.receipts.push(Receipt::Struct { id, elements });
        Ok(())
    }
}
