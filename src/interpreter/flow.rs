use super::Interpreter;
use crate::alloc::BackingAllocator;
use crate::call::Constructor;
use crate::consts::{MAX_CONSTRUCTORS, MAX_CONSTRUCTOR_ARGS, MAX_STRUCTS};
use crate::error::InterpreterError;
use crate::state::ExecuteState;
use crate::structs::Struct;

use dse_asm::{Command, Condition, Opcode, PanicReason, RegisterId};

impl<A> Interpreter<A> {
    /// Scan forward past a nested block without executing it, leaving
    /// the program counter just after the matching `close` command.
    ///
    /// With `stop_at_else`, an `ELSE` at depth one also ends the scan;
    /// the returned opcode tells which closer was hit.
    pub(crate) fn skip_block(&mut self, open: Opcode, close: Opcode, stop_at_else: bool) -> Result<Opcode, PanicReason> {
        let mut depth = 1usize;

        while self.pc < self.program.len() {
            let cmd = self.fetch()?;
            let op = cmd.word().opcode()?;

            if op == Opcode::WriteArray {
                self.pc += Self::array_payload_len(&cmd)?;
            }

            if op == open {
                depth += 1;
            } else if op == close {
                depth -= 1;
                if depth == 0 {
                    return Ok(op);
                }
            } else if stop_at_else && op == Opcode::Else && depth == 1 {
                return Ok(op);
            }
        }

        Err(PanicReason::UnbalancedBlock)
    }

    /// An `ELSE` reached in execution means the taken branch is done:
    /// resume after the matching `END_IF`.
    pub(crate) fn else_taken(&mut self) -> Result<(), PanicReason> {
        self.skip_block(Opcode::If, Opcode::EndIf, false)?;
        Ok(())
    }

    /// Record a constructor's entry point and skip its body.
    pub(crate) fn declare_constructor(&mut self, cmd: &Command) -> Result<(), PanicReason> {
        let word = cmd.word().0;
        let id = ((word >> 11) & 0x1F) as usize;
        let arg_count = ((word >> 8) & 0x7) as usize;
        let read_only = (word & 0x1F) as u8;

        if id >= MAX_CONSTRUCTORS {
            return Err(PanicReason::MalformedCommand);
        }
        if arg_count > MAX_CONSTRUCTOR_ARGS {
            return Err(PanicReason::TooManyArguments);
        }

        let start_address = self.pc;
        self.skip_block(Opcode::StartConstructor, Opcode::EndConstructor, false)?;
        self.constructors[id] = Some(Constructor::new(start_address, arg_count, read_only));
        Ok(())
    }
}

impl<A> Interpreter<A>
where
    A: BackingAllocator,
{
    pub(crate) fn exec_if(&mut self, cmd: &Command) -> Result<ExecuteState, InterpreterError> {
        let wrap = |reason| InterpreterError::PanicCommand(reason, *cmd);

        let cond = Condition::try_from(cmd.word().low_nibble()).map_err(wrap)?;
        let left = self.registers[cmd.word().src1()];

        let taken = if cond.is_binary() {
            let mut idx = 0;
            let right = self
                .operand(cmd, cmd.src2_in_use(), cmd.word().src2(), &mut idx)
                .map_err(wrap)?;

            match cond {
                Condition::Equal => left == right,
                Condition::NotEqual => left != right,
                Condition::LessOrEqual => left <= right,
                Condition::Less => left < right,
                Condition::GreaterOrEqual => left >= right,
                Condition::Greater => left > right,
                Condition::IsZero | Condition::IsNotZero => unreachable!("unary comparators"),
            }
        } else {
            match cond {
                Condition::IsZero => left == 0,
                Condition::IsNotZero => left != 0,
                _ => unreachable!("binary comparators"),
            }
        };

        if !taken {
            // resume after the matching ELSE, or after END_IF when the
            // conditional has no alternative branch
            self.skip_block(Opcode::If, Opcode::EndIf, true).map_err(wrap)?;
        }

        Ok(ExecuteState::Proceed)
    }

    pub(crate) fn exec_loop(&mut self, cmd: &Command) -> Result<ExecuteState, InterpreterError> {
        let wrap = |reason| InterpreterError::PanicCommand(reason, *cmd);

        let counter = cmd.word().low_nibble() as RegisterId;
        let mut idx = 0;
        let start = self
            .operand(cmd, cmd.dest_in_use(), cmd.word().dest(), &mut idx)
            .map_err(wrap)?;
        let end = self
            .operand(cmd, cmd.src1_in_use(), cmd.word().src1(), &mut idx)
            .map_err(wrap)?;
        let step = self
            .operand(cmd, cmd.src2_in_use(), cmd.word().src2(), &mut idx)
            .map_err(wrap)?;

        if step == 0 {
            return Err(wrap(PanicReason::ArithmeticError));
        }

        // zero iterations: the counter register stays untouched
        if start >= end {
            self.skip_block(Opcode::Loop, Opcode::EndLoop, false).map_err(wrap)?;
            return Ok(ExecuteState::Proceed);
        }

        self.stack.push(self.pc).map_err(wrap)?;
        let body = self.pc;

        let mut value = start;
        loop {
            self.registers[counter] = value;
            self.pc = body;

            match self.run_block()? {
                ExecuteState::EndLoop => (),
                ExecuteState::BreakLoop => {
                    self.skip_block(Opcode::Loop, Opcode::EndLoop, false).map_err(wrap)?;
                    break;
                }
                ExecuteState::EndSpec => {
                    self.stack.pop();
                    return Ok(ExecuteState::EndSpec);
                }
                ExecuteState::EndConstructor => return Err(wrap(PanicReason::UnbalancedBlock)),
                ExecuteState::Proceed => unreachable!("run_block never proceeds"),
            }

            match value.checked_add(step) {
                Some(next) if next < end => value = next,
                _ => break,
            }
        }

        self.stack.pop();
        Ok(ExecuteState::Proceed)
    }

    pub(crate) fn exec_construct(&mut self, cmd: &Command) -> Result<ExecuteState, InterpreterError> {
        let wrap = |reason| InterpreterError::PanicCommand(reason, *cmd);

        let id = cmd.word().src1();
        let ctor = self
            .constructors
            .get(id)
            .copied()
            .flatten()
            .ok_or_else(|| wrap(PanicReason::ConstructorNotDeclared))?;

        let mut args = [0usize; MAX_CONSTRUCTOR_ARGS];
        if ctor.arg_count() > 0 {
            if cmd.data_length() < 1 {
                return Err(wrap(PanicReason::MalformedCommand));
            }
            let packed = cmd.data(0);
            for (i, arg) in args.iter_mut().take(ctor.arg_count()).enumerate() {
                *arg = ((packed >> (6 * i)) & 0x3F) as usize;
                if *arg >= MAX_STRUCTS {
                    return Err(wrap(PanicReason::StructNotDeclared));
                }
            }
        }

        // Swap each argument struct into its position slot. Read-only
        // positions get an isolated copy so the caller's entry survives
        // any WRITE_PARAM in the body.
        let mut saved: [Option<Struct>; MAX_CONSTRUCTOR_ARGS] = std::array::from_fn(|_| None);
        for i in 0..ctor.arg_count() {
            if ctor.is_read_only(i) {
                let copy = self.structs.clone_slot(args[i]).map_err(wrap)?;
                saved[i] = self.structs.replace(i, copy).map_err(wrap)?;
            } else {
                self.structs.swap(i, args[i]).map_err(wrap)?;
            }
        }

        self.stack.push(self.pc).map_err(wrap)?;
        self.pc = ctor.start_address();
        let state = self.run_block()?;

        let ret = self.stack.pop().ok_or_else(|| wrap(PanicReason::UnbalancedBlock))?;
        self.pc = ret;

        // Unswap in reverse order; read-only copies are discarded.
        for i in (0..ctor.arg_count()).rev() {
            if ctor.is_read_only(i) {
                self.structs.replace(i, saved[i].take()).map_err(wrap)?;
            } else {
                self.structs.swap(i, args[i]).map_err(wrap)?;
            }
        }

        match state {
            ExecuteState::EndConstructor => Ok(ExecuteState::Proceed),
            ExecuteState::EndSpec => Ok(ExecuteState::EndSpec),
            _ => Err(wrap(PanicReason::UnbalancedBlock)),
        }
    }
}
