use crate::{Opcode, PanicReason, RegisterId, Word};

use bitflags::bitflags;

bitflags! {
    /// One-hot register usage flags of a command word (bits 18:16).
    ///
    /// A clear bit means the corresponding register field is absent, not
    /// register zero.
    pub struct FieldUsage: u8 {
        const DEST = 0b100;
        const SRC1 = 0b010;
        const SRC2 = 0b001;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// The first 32-bit word of a command, with field extraction.
///
/// Layout, MSB to LSB: `[29:28]` trailing data word count, `[27:20]`
/// opcode, `[19]` signed flag, `[18:16]` field usage, `[15:12]` dest
/// register, `[11:8]` src1 register, `[7:4]` src2 register, `[3:0]` and
/// wider low slices are opcode specific.
pub struct CommandWord(pub u32);

impl CommandWord {
    /// Number of trailing 32-bit data words (0 to 3).
    pub const fn data_length(&self) -> usize {
        ((self.0 >> 28) & 0x3) as usize
    }

    /// The raw opcode byte.
    pub const fn opcode_byte(&self) -> u8 {
        ((self.0 >> 20) & 0xFF) as u8
    }

    /// The decoded opcode, or a fault for a byte outside the namespace.
    pub fn opcode(&self) -> Result<Opcode, PanicReason> {
        Opcode::try_from(self.opcode_byte())
    }

    /// Signed-arithmetic flag (bit 19).
    pub const fn is_signed(&self) -> bool {
        (self.0 >> 19) & 0x1 == 0x1
    }

    /// The register usage flags.
    pub fn field_usage(&self) -> FieldUsage {
        FieldUsage::from_bits_truncate(((self.0 >> 16) & 0x7) as u8)
    }

    /// Destination register field.
    pub const fn dest(&self) -> RegisterId {
        ((self.0 >> 12) & 0xF) as RegisterId
    }

    /// First source register field.
    pub const fn src1(&self) -> RegisterId {
        ((self.0 >> 8) & 0xF) as RegisterId
    }

    /// Second source register field.
    pub const fn src2(&self) -> RegisterId {
        ((self.0 >> 4) & 0xF) as RegisterId
    }

    /// Low byte, used by several opcodes for counts and selectors.
    pub const fn low_byte(&self) -> u8 {
        (self.0 & 0xFF) as u8
    }

    /// Low nibble, used for comparator, operation and slot selectors.
    pub const fn low_nibble(&self) -> u8 {
        (self.0 & 0xF) as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// A decoded command: the command word plus its trailing data words.
pub struct Command {
    word: CommandWord,
    data: [u32; 3],
}

impl Command {
    pub const fn new(word: CommandWord, data: [u32; 3]) -> Self {
        Self { word, data }
    }

    pub const fn word(&self) -> CommandWord {
        self.word
    }

    /// Trailing data word `idx`; zero when the command carries fewer.
    pub const fn data(&self, idx: usize) -> u32 {
        self.data[idx]
    }

    pub const fn data_length(&self) -> usize {
        self.word.data_length()
    }

    /// Two consecutive data words as one value, high word first.
    pub const fn data_wide(&self, idx: usize) -> Word {
        ((self.data[idx] as Word) << 32) | self.data[idx + 1] as Word
    }

    pub fn dest_in_use(&self) -> bool {
        self.word.field_usage().contains(FieldUsage::DEST)
    }

    pub fn src1_in_use(&self) -> bool {
        self.word.field_usage().contains(FieldUsage::SRC1)
    }

    pub fn src2_in_use(&self) -> bool {
        self.word.field_usage().contains(FieldUsage::SRC2)
    }
}
