use super::Interpreter;

use dse_asm::{ArithmeticOp, Command, LogicalOp, PanicReason, RegisterId, Word};

impl<A> Interpreter<A> {
    /// Resolve an ALU operand; immediates are sign-extended from 32
    /// bits when the command's signed flag is set.
    fn alu_operand(
        &self,
        cmd: &Command,
        in_use: bool,
        reg: RegisterId,
        idx: &mut usize,
        signed: bool,
    ) -> Result<Word, PanicReason> {
        let value = self.operand(cmd, in_use, reg, idx)?;
        if signed && !in_use {
            Ok(value as u32 as i32 as i64 as Word)
        } else {
            Ok(value)
        }
    }

    pub(crate) fn arith_op(&mut self, cmd: &Command) -> Result<(), PanicReason> {
        let op = ArithmeticOp::try_from(cmd.word().low_nibble())?;
        let signed = cmd.word().is_signed();

        let mut idx = 0;
        let a = self.alu_operand(cmd, cmd.src1_in_use(), cmd.word().src1(), &mut idx, signed)?;
        let b = self.alu_operand(cmd, cmd.src2_in_use(), cmd.word().src2(), &mut idx, signed)?;

        // two's complement wrapping covers the signed forms
        let result = match op {
            ArithmeticOp::Add => a.wrapping_add(b),
            ArithmeticOp::Sub => a.wrapping_sub(b),
            ArithmeticOp::Mul => a.wrapping_mul(b),
        };

        self.registers[cmd.word().dest()] = result;
        Ok(())
    }

    pub(crate) fn logic_op(&mut self, cmd: &Command) -> Result<(), PanicReason> {
        let op = LogicalOp::try_from(cmd.word().low_nibble())?;

        let mut idx = 0;
        let a = self.operand(cmd, cmd.src1_in_use(), cmd.word().src1(), &mut idx)?;

        let result = match op {
            LogicalOp::Not => !a,
            binary => {
                let b = self.operand(cmd, cmd.src2_in_use(), cmd.word().src2(), &mut idx)?;
                match binary {
                    LogicalOp::Shl => u32::try_from(b).ok().and_then(|s| a.checked_shl(s)).unwrap_or(0),
                    LogicalOp::Shr => u32::try_from(b).ok().and_then(|s| a.checked_shr(s)).unwrap_or(0),
                    LogicalOp::Or => a | b,
                    LogicalOp::And => a & b,
                    LogicalOp::Xor => a ^ b,
                    LogicalOp::Not => unreachable!(),
                }
            }
        };

        self.registers[cmd.word().dest()] = result;
        Ok(())
    }

    pub(crate) fn mv(&mut self, cmd: &Command) -> Result<(), PanicReason> {
        let value = if cmd.src1_in_use() {
            self.registers[cmd.word().src1()]
        } else {
            match cmd.data_length() {
                1 => cmd.data(0) as Word,
                2 => cmd.data_wide(0),
                _ => return Err(PanicReason::MalformedCommand),
            }
        };

        self.registers[cmd.word().dest()] = value;
        Ok(())
    }
}
