//! Executor parameters and wire constants.

/// Register count of the executor.
pub const VM_REGISTER_COUNT: usize = 16;

/// Number of memory region slots.
pub const MAX_MEM_REGIONS: usize = 16;

/// Number of struct slots.
pub const MAX_STRUCTS: usize = 32;

/// Maximum number of elements in one struct.
pub const MAX_STRUCT_ELEMS: usize = 256;

/// Number of constructor slots.
pub const MAX_CONSTRUCTORS: usize = 15;

/// Maximum arguments a constructor may take.
pub const MAX_CONSTRUCTOR_ARGS: usize = 5;

/// Call stack capacity, in saved program counters.
pub const MAX_STACK_DEPTH: usize = 64;

/// Maximum characters of inline print text (encoded count is one less).
pub const MAX_PRINT_TEXT: usize = 12;

/// Byte size of one command word.
pub const CMD_WORD_SIZE: usize = 4;

/// Region sizes are rounded up to this granularity.
pub const REGION_ALIGN: u32 = 4;

/// Magic number identifying a data specification file.
pub const DSG_MAGIC_NUM: u32 = 0x5B7C_A17E;

/// Magic number prefixed to the produced application data.
pub const APPDATA_MAGIC_NUM: u32 = 0xAD13_0AD6;

/// Version of the data produced by the executor.
pub const DSE_VERSION: u32 = 0x0001_0000;

/// Byte size of the output header (magic + version).
pub const APP_PTR_TABLE_HEADER_BYTE_SIZE: usize = 8;

/// Byte size of the pointer table, one word per region slot.
pub const POINTER_TABLE_SIZE: usize = 4 * MAX_MEM_REGIONS;

/// Byte size of the full output area: header plus pointer table.
pub const APP_DATA_SIZE: usize = APP_PTR_TABLE_HEADER_BYTE_SIZE + POINTER_TABLE_SIZE;

/// Default top of the target address space handed to the bump allocator.
pub const DEFAULT_MEMORY_TOP: u32 = 0x6000_0000;

/// Default floor of the target address space.
pub const DEFAULT_MEMORY_FLOOR: u32 = 0x0001_0000;
