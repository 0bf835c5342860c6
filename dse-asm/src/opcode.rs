use crate::PanicReason;

use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter)]
#[repr(u8)]
/// Opcode namespace of the data specification language.
///
/// The namespace is closed: a command byte that maps to no variant is not
/// a data specification command and aborts the program.
pub enum Opcode {
    /// Abort the program with a diagnostic.
    Break = 0x00,
    /// No operation.
    Nop = 0x01,
    /// Allocate a memory region.
    Reserve = 0x02,
    /// Release a memory region.
    Free = 0x03,
    /// Declare a random number generator. Reserved.
    DeclareRng = 0x05,
    /// Declare a random distribution. Reserved.
    DeclareRandomDist = 0x06,
    /// Draw a random number. Reserved.
    GetRandomNumber = 0x07,
    /// Open a struct definition.
    StartStruct = 0x10,
    /// Define one element of the open struct.
    StructElem = 0x11,
    /// Close a struct definition.
    EndStruct = 0x12,
    /// Open a packing specification. Reserved.
    StartPackspec = 0x1A,
    /// Pack a parameter into a field. Reserved.
    PackParam = 0x1B,
    /// Close a packing specification. Reserved.
    EndPackspec = 0x1C,
    /// Declare a constructor sub-program.
    StartConstructor = 0x20,
    /// Return from a constructor body.
    EndConstructor = 0x25,
    /// Call a constructor with struct arguments.
    Construct = 0x40,
    /// Read from the focused region into a register.
    Read = 0x41,
    /// Write a primitive value, possibly repeated.
    Write = 0x42,
    /// Write an inline array.
    WriteArray = 0x43,
    /// Write a struct as packed binary, possibly repeated.
    WriteStruct = 0x44,
    /// Copy bytes between absolute addresses.
    BlockCopy = 0x45,
    /// Select the region subsequent writes go to.
    SwitchFocus = 0x50,
    /// Open a counted loop.
    Loop = 0x51,
    /// Terminate the current loop early.
    BreakLoop = 0x52,
    /// Close a loop body.
    EndLoop = 0x53,
    /// Conditional execution.
    If = 0x55,
    /// Alternative branch of an `If`.
    Else = 0x56,
    /// Close a conditional block.
    EndIf = 0x57,
    /// Move a value into a register.
    Mv = 0x60,
    /// Load the focused region's write offset into a register.
    GetWrPtr = 0x63,
    /// Set or adjust the focused region's write pointer.
    SetWrPtr = 0x64,
    /// Return the focused region's write pointer to the region start.
    ResetWrPtr = 0x65,
    /// Round the write pointer up to a power-of-two boundary.
    AlignWrPtr = 0x66,
    /// Add, subtract or multiply.
    ArithOp = 0x67,
    /// Shift or bitwise operation.
    LogicOp = 0x68,
    /// Reformat a region. Reserved.
    Reformat = 0x6A,
    /// Replace a struct slot with a copy of another.
    CopyStruct = 0x70,
    /// Copy one struct element to another struct or a register.
    CopyParam = 0x71,
    /// Overwrite one struct element.
    WriteParam = 0x72,
    /// Load one struct element into a register.
    ReadParam = 0x73,
    /// Write a component of a packed parameter. Reserved.
    WriteParamComponent = 0x74,
    /// Emit a value to the log sink.
    PrintVal = 0x80,
    /// Emit inline packed text to the log sink.
    PrintTxt = 0x81,
    /// Emit a struct's elements to the log sink.
    PrintStruct = 0x82,
    /// Terminate the program.
    EndSpec = 0xFF,
}

impl Opcode {
    /// Whether the opcode is reserved: recognised by the dispatcher but
    /// reported as unimplemented without aborting the program.
    pub const fn is_reserved(&self) -> bool {
        matches!(
            self,
            Self::DeclareRng
                | Self::DeclareRandomDist
                | Self::GetRandomNumber
                | Self::StartPackspec
                | Self::PackParam
                | Self::EndPackspec
                | Self::Reformat
                | Self::WriteParamComponent
        )
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl TryFrom<u8> for Opcode {
    type Error = PanicReason;

    fn try_from(b: u8) -> Result<Self, Self::Error> {
        use Opcode::*;

        match b {
            0x00 => Ok(Break),
            0x01 => Ok(Nop),
            0x02 => Ok(Reserve),
            0x03 => Ok(Free),
            0x05 => Ok(DeclareRng),
            0x06 => Ok(DeclareRandomDist),
            0x07 => Ok(GetRandomNumber),
            0x10 => Ok(StartStruct),
            0x11 => Ok(StructElem),
            0x12 => Ok(EndStruct),
            0x1A => Ok(StartPackspec),
            0x1B => Ok(PackParam),
            0x1C => Ok(EndPackspec),
            0x20 => Ok(StartConstructor),
            0x25 => Ok(EndConstructor),
            0x40 => Ok(Construct),
            0x41 => Ok(Read),
            0x42 => Ok(Write),
            0x43 => Ok(WriteArray),
            0x44 => Ok(WriteStruct),
            0x45 => Ok(BlockCopy),
            0x50 => Ok(SwitchFocus),
            0x51 => Ok(Loop),
            0x52 => Ok(BreakLoop),
            0x53 => Ok(EndLoop),
            0x55 => Ok(If),
            0x56 => Ok(Else),
            0x57 => Ok(EndIf),
            0x60 => Ok(Mv),
            0x63 => Ok(GetWrPtr),
            0x64 => Ok(SetWrPtr),
            0x65 => Ok(ResetWrPtr),
            0x66 => Ok(AlignWrPtr),
            0x67 => Ok(ArithOp),
            0x68 => Ok(LogicOp),
            0x6A => Ok(Reformat),
            0x70 => Ok(CopyStruct),
            0x71 => Ok(CopyParam),
            0x72 => Ok(WriteParam),
            0x73 => Ok(ReadParam),
            0x74 => Ok(WriteParamComponent),
            0x80 => Ok(PrintVal),
            0x81 => Ok(PrintTxt),
            0x82 => Ok(PrintStruct),
            0xFF => Ok(EndSpec),
            _ => Err(PanicReason::NotADseCommand),
        }
    }
}
