use super::Interpreter;
use crate::alloc::BackingAllocator;
use crate::consts::CMD_WORD_SIZE;
use crate::error::InterpreterError;
use crate::state::{ExecuteState, ProgramState};

use dse_asm::{Command, CommandWord, Opcode, PanicReason, RegisterId, Word};
use tracing::{debug, error, warn};

impl<A> Interpreter<A>
where
    A: BackingAllocator,
{
    /// Execute a whole data specification.
    ///
    /// Runs until `END_SPEC` or until the command stream is exhausted;
    /// any fault aborts the program.
    pub fn run(&mut self, spec: &[u8]) -> Result<ProgramState, InterpreterError> {
        self.load(spec)?;
        debug!(len = self.program.len(), "executing data specification");

        loop {
            if self.pc >= self.program.len() {
                return Ok(ProgramState::Exhausted);
            }

            match self.step()? {
                ExecuteState::Proceed => (),
                ExecuteState::EndSpec => return Ok(ProgramState::Terminated),
                // a loop or constructor closer with no open frame
                _ => return Err(InterpreterError::Panic(PanicReason::UnbalancedBlock)),
            }
        }
    }

    /// Decode and execute the command at the program counter.
    pub(crate) fn step(&mut self) -> Result<ExecuteState, InterpreterError> {
        let cmd = self.fetch().map_err(InterpreterError::Panic)?;
        self.instruction(cmd)
    }

    /// Run commands until the current frame returns. Reaching the end
    /// of the stream inside a frame means a closer is missing.
    pub(crate) fn run_block(&mut self) -> Result<ExecuteState, InterpreterError> {
        loop {
            if self.pc >= self.program.len() {
                return Err(InterpreterError::Panic(PanicReason::UnbalancedBlock));
            }

            let state = self.step()?;
            if !state.should_continue() {
                return Ok(state);
            }
        }
    }

    /// Execute a single decoded command.
    pub fn instruction(&mut self, cmd: Command) -> Result<ExecuteState, InterpreterError> {
        let op = cmd
            .word()
            .opcode()
            .map_err(|reason| InterpreterError::PanicCommand(reason, cmd))?;

        // Commands that re-enter the dispatcher propagate errors from
        // their bodies as-is; everything else faults with its own
        // command attached.
        match op {
            Opcode::Loop => self.exec_loop(&cmd),
            Opcode::If => self.exec_if(&cmd),
            Opcode::Construct => self.exec_construct(&cmd),
            _ => self
                ._instruction(op, &cmd)
                .map_err(|reason| InterpreterError::PanicCommand(reason, cmd)),
        }
    }

    fn _instruction(&mut self, op: Opcode, cmd: &Command) -> Result<ExecuteState, PanicReason> {
        use ExecuteState::*;

        match op {
            Opcode::Break => {
                error!("BREAK encountered");
                Err(PanicReason::BreakEncountered)
            }

            Opcode::Nop => Ok(Proceed),

            Opcode::EndSpec => {
                debug!("end of spec has been reached");
                Ok(EndSpec)
            }

            Opcode::EndLoop => Ok(EndLoop),
            Opcode::BreakLoop => Ok(BreakLoop),
            Opcode::EndConstructor => Ok(EndConstructor),
            Opcode::EndIf => Ok(Proceed),
            Opcode::Else => self.else_taken().map(|_| Proceed),

            Opcode::Reserve => self.reserve(cmd).map(|_| Proceed),
            Opcode::Free => self.free(cmd).map(|_| Proceed),
            Opcode::SwitchFocus => self.switch_focus(cmd).map(|_| Proceed),

            Opcode::Write => self.write(cmd).map(|_| Proceed),
            Opcode::WriteArray => self.write_array(cmd).map(|_| Proceed),
            Opcode::WriteStruct => self.write_struct(cmd).map(|_| Proceed),
            Opcode::BlockCopy => self.block_copy(cmd).map(|_| Proceed),

            Opcode::Read => self.read(cmd).map(|_| Proceed),
            Opcode::GetWrPtr => self.get_wr_ptr(cmd).map(|_| Proceed),
            Opcode::SetWrPtr => self.set_wr_ptr(cmd).map(|_| Proceed),
            Opcode::ResetWrPtr => self.reset_wr_ptr().map(|_| Proceed),
            Opcode::AlignWrPtr => self.align_wr_ptr(cmd).map(|_| Proceed),

            Opcode::StartStruct => self.start_struct(cmd).map(|_| Proceed),
            // element and end markers are consumed by `start_struct`
            Opcode::StructElem | Opcode::EndStruct => Err(PanicReason::UnbalancedBlock),

            Opcode::StartConstructor => self.declare_constructor(cmd).map(|_| Proceed),

            Opcode::WriteParam => self.write_param(cmd).map(|_| Proceed),
            Opcode::ReadParam => self.read_param(cmd).map(|_| Proceed),
            Opcode::CopyParam => self.copy_param(cmd).map(|_| Proceed),
            Opcode::CopyStruct => self.copy_struct(cmd).map(|_| Proceed),

            Opcode::Mv => self.mv(cmd).map(|_| Proceed),
            Opcode::ArithOp => self.arith_op(cmd).map(|_| Proceed),
            Opcode::LogicOp => self.logic_op(cmd).map(|_| Proceed),

            Opcode::PrintVal => self.print_val(cmd).map(|_| Proceed),
            Opcode::PrintTxt => self.print_txt(cmd).map(|_| Proceed),
            Opcode::PrintStruct => self.print_struct(cmd).map(|_| Proceed),

            Opcode::DeclareRng
            | Opcode::DeclareRandomDist
            | Opcode::GetRandomNumber
            | Opcode::StartPackspec
            | Opcode::PackParam
            | Opcode::EndPackspec
            | Opcode::Reformat
            | Opcode::WriteParamComponent => {
                warn!("Unimplemented DSE command {op}");
                Ok(Proceed)
            }

            Opcode::Loop | Opcode::If | Opcode::Construct => unreachable!("dispatched by `instruction`"),
        }
    }
}

impl<A> Interpreter<A> {
    /// Read the command at the program counter and advance past it and
    /// its data words.
    pub(crate) fn fetch(&mut self) -> Result<Command, PanicReason> {
        let word = CommandWord(self.fetch_word()?);

        let mut data = [0u32; 3];
        for slot in data.iter_mut().take(word.data_length()) {
            *slot = self.fetch_word()?;
        }

        Ok(Command::new(word, data))
    }

    pub(crate) fn fetch_word(&mut self) -> Result<u32, PanicReason> {
        let bytes = self
            .program
            .get(self.pc..self.pc + CMD_WORD_SIZE)
            .ok_or(PanicReason::MalformedCommand)?;
        self.pc += CMD_WORD_SIZE;

        Ok(u32::from_le_bytes(bytes.try_into().unwrap_or_else(|_| unreachable!())))
    }

    /// Resolve one operand slot: the register when its usage bit is
    /// set, otherwise the next immediate data word.
    pub(crate) fn operand(
        &self,
        cmd: &Command,
        in_use: bool,
        reg: RegisterId,
        idx: &mut usize,
    ) -> Result<Word, PanicReason> {
        if in_use {
            return Ok(self.registers[reg]);
        }

        if *idx >= cmd.data_length() {
            return Err(PanicReason::MalformedCommand);
        }
        let value = cmd.data(*idx) as Word;
        *idx += 1;
        Ok(value)
    }

    /// Like [`operand`], but a slot with no data word left falls back
    /// to the 4-bit field value itself as the immediate.
    ///
    /// [`operand`]: Self::operand
    pub(crate) fn operand_or_field(&self, cmd: &Command, in_use: bool, reg: RegisterId, idx: &mut usize) -> Word {
        if in_use {
            self.registers[reg]
        } else if *idx < cmd.data_length() {
            let value = cmd.data(*idx) as Word;
            *idx += 1;
            value
        } else {
            reg as Word
        }
    }
}
