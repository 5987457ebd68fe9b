/// The Bitcoin base58 alphabet (no `0`, `O`, `I` or `l`).
pub const ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// [`ALPHABET`] as bytes, indexable by digit value.
pub const ALPHABET_BYTES: &[u8; 58] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Byte prepended to every payload before encoding.
pub const SENTINEL: u8 = 0x01;

/// Reverse lookup: ASCII byte -> digit value, `0xff` for bytes outside the alphabet.
pub(crate) static DIGITS: [u8; 128] = {
    let mut table = [0xffu8; 128];
    let mut i = 0;
    while i < 58 {
        table[ALPHABET_BYTES[i] as usize] = i as u8;
        i += 1;
    }
    table
};
