// Major types (high three bits of the initial byte).
pub const MAJOR_UNSIGNED: u8 = 0;
pub const MAJOR_NEGATIVE: u8 = 1;
pub const MAJOR_BYTES: u8 = 2;
pub const MAJOR_TEXT: u8 = 3;
pub const MAJOR_ARRAY: u8 = 4;
pub const MAJOR_MAP: u8 = 5;
pub const MAJOR_TAG: u8 = 6;
pub const MAJOR_SIMPLE: u8 = 7;

// Additional-information values.
pub const INFO_U8: u8 = 24;
pub const INFO_U16: u8 = 25;
pub const INFO_U32: u8 = 26;
pub const INFO_U64: u8 = 27;
pub const INFO_INDEFINITE: u8 = 31;

pub const FALSE: u8 = 0xf4;
pub const TRUE: u8 = 0xf5;
pub const NULL: u8 = 0xf6;
pub const UNDEFINED: u8 = 0xf7;
pub const SIMPLE_U8: u8 = 0xf8;
pub const FLOAT16: u8 = 0xf9;
pub const FLOAT32: u8 = 0xfa;
pub const FLOAT64: u8 = 0xfb;
pub const BREAK: u8 = 0xff;

// Semantic tags.
pub const TAG_DATETIME_STRING: u64 = 0;
pub const TAG_EPOCH_DATETIME: u64 = 1;
pub const TAG_DECIMAL: u64 = 4;
pub const TAG_FRACTION: u64 = 30;
pub const TAG_REGEX: u64 = 35;
pub const TAG_MIME: u64 = 36;
pub const TAG_UUID: u64 = 37;
pub const TAG_SET: u64 = 258;
pub const TAG_IP_ADDRESS: u64 = 260;
pub const TAG_IP_NETWORK: u64 = 261;
pub const TAG_SELF_DESCRIBE: u64 = 55799;
