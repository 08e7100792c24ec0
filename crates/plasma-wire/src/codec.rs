//! Int32X varint and fixed-width primitive encoders.
//!
//! All multi-byte fixed values are big-endian. Decoding lives on
//! [`Message`](crate::Message), which owns the read cursor; the bit-level
//! Int32X decoder is shared through [`decode_int32x`].

/// Appends `value` as a single byte (low 8 bits).
#[inline]
pub fn write_byte(out: &mut Vec<u8>, value: u8) {
    out.push(value);
}

/// Appends `value` as 4 big-endian bytes.
#[inline]
pub fn write_int32(out: &mut Vec<u8>, value: i32) {
    out.extend_from_slice(&value.to_be_bytes());
}

#[inline]
pub fn write_real32(out: &mut Vec<u8>, value: f32) {
    write_int32(out, value.to_bits() as i32);
}

/// Appends the 64-bit pattern as two `Int32` words, high word first.
#[inline]
pub fn write_real64(out: &mut Vec<u8>, value: f64) {
    let bits = value.to_bits();
    write_int32(out, (bits >> 32) as u32 as i32);
    write_int32(out, bits as u32 as i32);
}

/// Appends `value` in Int32X form (1..5 bytes).
///
/// Layout:
///
/// ```text
/// 0xxxxxxx                          0 .. 127
/// 11xxxxxx                        -64 .. -1
/// 10xxxxxx 0yyyyyyy                13-bit signed
/// 10xxxxxx 1yyyyyyy 0zzzzzzz       20-bit signed
/// ...                              27 / 34-bit signed
/// ```
///
/// The six data bits in the lead byte carry the sign of the whole value.
pub fn write_int32x(out: &mut Vec<u8>, value: i32) {
    if (-64..128).contains(&value) {
        out.push(value as u8);
        return;
    }

    let v = value as i64;
    let mut extra_bytes = 1;
    let mut shift = 7;
    let mut min: i64 = -0x1000;
    let mut max: i64 = 0x0FFF;
    for _ in 0..3 {
        if v >= min && v <= max {
            break;
        }
        extra_bytes += 1;
        shift += 7;
        min <<= 7;
        max = (max << 7) | 0xFF;
    }

    out.push(0b1000_0000 | ((v >> shift) & 0b0011_1111) as u8);

    for _ in 1..extra_bytes {
        shift -= 7;
        out.push(0b1000_0000 | ((v >> shift) & 0b0111_1111) as u8);
    }

    shift -= 7;
    out.push(((v >> shift) & 0b0111_1111) as u8);
}

/// Number of bytes [`write_int32x`] emits for `value`.
pub fn int32x_len(value: i32) -> usize {
    if (-64..128).contains(&value) {
        return 1;
    }
    let v = value as i64;
    let mut len = 2;
    let mut min: i64 = -0x1000;
    let mut max: i64 = 0x0FFF;
    while len < 5 && !(v >= min && v <= max) {
        len += 1;
        min <<= 7;
        max = (max << 7) | 0xFF;
    }
    len
}

/// Decodes one Int32X value, pulling bytes from `next`.
///
/// `next` is called at most 5 times. Sources that run dry should yield 0,
/// which terminates a multi-byte sequence.
pub fn decode_int32x(mut next: impl FnMut() -> u8) -> i32 {
    let b = next();
    if b & 0xC0 != 0x80 {
        return b as i8 as i32;
    }

    let mut result = (b & 0b0011_1111) as i64;
    if result >= 32 {
        result -= 64;
    }

    for _ in 0..4 {
        let n = next();
        result = (result << 7) | (n & 0b0111_1111) as i64;
        if n & 0b1000_0000 == 0 {
            break;
        }
    }

    result as i32
}

/// Appends `value` as an Int32X scalar count followed by one Int32X per
/// Unicode scalar value.
pub fn write_string(out: &mut Vec<u8>, value: &str) {
    write_int32x(out, value.chars().count() as i32);
    for ch in value.chars() {
        write_int32x(out, ch as i32);
    }
}
