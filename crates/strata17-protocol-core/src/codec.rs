use bytes::{Buf, BufMut, BytesMut};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("not enough data: need {need} bytes, have {have}")]
    NotEnoughData { need: usize, have: usize },
    #[error("string too long: {0} UCS-2 code units")]
    StringTooLong(usize),
    #[error("string contains a code point outside the basic multilingual plane: {0:?}")]
    NonBmpCodePoint(char),
    #[error("string contains an unpaired UTF-16 surrogate")]
    UnpairedSurrogate,
    #[error("unknown packet id: 0x{0:02X}")]
    UnknownPacketId(u8),
    #[error("packet 0x{id:02X} is not valid in state {state:?} / direction {direction:?}")]
    WrongState {
        id: u8,
        state: &'static str,
        direction: &'static str,
    },
}

pub type CodecResult<T> = Result<T, CodecError>;

macro_rules! require {
    ($buf:expr, $n:expr) => {
        if $buf.remaining() < $n {
            return Err(CodecError::NotEnoughData {
                need: $n,
                have: $buf.remaining(),
            });
        }
    };
}

pub fn read_bool(buf: &mut BytesMut) -> CodecResult<bool> {
    require!(buf, 1);
    Ok(buf.get_u8() != 0)
}

pub fn write_bool(buf: &mut BytesMut, value: bool) {
    buf.put_u8(if value { 1 } else { 0 });
}

pub fn read_i8(buf: &mut BytesMut) -> CodecResult<i8> {
    require!(buf, 1);
    Ok(buf.get_i8())
}

pub fn write_i8(buf: &mut BytesMut, value: i8) {
    buf.put_i8(value);
}

pub fn read_u8(buf: &mut BytesMut) -> CodecResult<u8> {
    require!(buf, 1);
    Ok(buf.get_u8())
}

pub fn write_u8(buf: &mut BytesMut, value: u8) {
    buf.put_u8(value);
}

pub fn read_i16(buf: &mut BytesMut) -> CodecResult<i16> {
    require!(buf, 2);
    Ok(buf.get_i16())
}

pub fn write_i16(buf: &mut BytesMut, value: i16) {
    buf.put_i16(value);
}

pub fn read_i32(buf: &mut BytesMut) -> CodecResult<i32> {
    require!(buf, 4);
    Ok(buf.get_i32())
}

pub fn write_i32(buf: &mut BytesMut, value: i32) {
    buf.put_i32(value);
}

pub fn read_i64(buf: &mut BytesMut) -> CodecResult<i64> {
    require!(buf, 8);
    Ok(buf.get_i64())
}

pub fn write_i64(buf: &mut BytesMut, value: i64) {
    buf.put_i64(value);
}

pub fn read_f32(buf: &mut BytesMut) -> CodecResult<f32> {
    require!(buf, 4);
    Ok(buf.get_f32())
}

pub fn write_f32(buf: &mut BytesMut, value: f32) {
    buf.put_f32(value);
}

pub fn read_f64(buf: &mut BytesMut) -> CodecResult<f64> {
    require!(buf, 8);
    Ok(buf.get_f64())
}

pub fn write_f64(buf: &mut BytesMut, value: f64) {
    buf.put_f64(value);
}

pub fn read_bytes(buf: &mut BytesMut, len: usize) -> CodecResult<Vec<u8>> {
    require!(buf, len);
    Ok(buf.split_to(len).to_vec())
}

pub fn write_bytes(buf: &mut BytesMut, data: &[u8]) {
    buf.put_slice(data);
}

/// Converts a UTF-8 string to the protocol's UCS-2 code units. Fails on any character
/// outside the basic multilingual plane: the dialect predates surrogate-pair handling,
/// so a conservative reimplementation refuses to emit them rather than guess.
pub fn utf8_to_ucs2(s: &str) -> CodecResult<Vec<u16>> {
    let mut out = Vec::with_capacity(s.len());
    for c in s.chars() {
        if (c as u32) > 0xFFFF {
            return Err(CodecError::NonBmpCodePoint(c));
        }
        out.push(c as u16);
    }
    Ok(out)
}

/// Converts UCS-2 code units back to a UTF-8 `String`. Fails on unpaired surrogates.
pub fn ucs2_to_utf8(units: &[u16]) -> CodecResult<String> {
    char::decode_utf16(units.iter().copied())
        .collect::<Result<String, _>>()
        .map_err(|_| CodecError::UnpairedSurrogate)
}

/// Reads a UCS-2-BE string: a `u16` code-unit count followed by that many `u16`s.
pub fn read_string(buf: &mut BytesMut, max_len: usize) -> CodecResult<String> {
    require!(buf, 2);
    let len = buf.get_u16() as usize;
    if len > max_len {
        return Err(CodecError::StringTooLong(len));
    }
    require!(buf, len * 2);
    let mut units = Vec::with_capacity(len);
    for _ in 0..len {
        units.push(buf.get_u16());
    }
    ucs2_to_utf8(&units)
}

/// Writes a UCS-2-BE string.
pub fn write_string(buf: &mut BytesMut, s: &str) -> CodecResult<()> {
    let units = utf8_to_ucs2(s)?;
    buf.put_u16(units.len() as u16);
    for unit in units {
        buf.put_u16(unit);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn string_round_trip_bmp() {
        let mut buf = BytesMut::new();
        write_string(&mut buf, "Play").unwrap();
        assert_eq!(buf.to_vec(), vec![0x00, 0x04, 0x00, 0x50, 0x00, 0x6C, 0x00, 0x61, 0x00, 0x79]);
        let s = read_string(&mut buf, 64).unwrap();
        assert_eq!(s, "Play");
    }

    #[test]
    fn string_round_trip_random_bmp() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let len = rng.gen_range(0..20);
            let s: String = (0..len)
                .map(|_| char::from_u32(rng.gen_range(0x20..0xD700)).unwrap())
                .collect();
            let mut buf = BytesMut::new();
            write_string(&mut buf, &s).unwrap();
            let decoded = read_string(&mut buf, 64).unwrap();
            assert_eq!(decoded, s);
        }
    }

    #[test]
    fn non_bmp_string_rejected() {
        let s = "\u{1F600}"; // an emoji, outside the BMP
        assert!(utf8_to_ucs2(s).is_err());
    }

    #[test]
    fn scalar_round_trips() {
        let mut buf = BytesMut::new();
        write_i32(&mut buf, -42);
        write_i64(&mut buf, 123456789);
        write_f32(&mut buf, 1.5);
        write_f64(&mut buf, -2.25);
        write_bool(&mut buf, true);
        assert_eq!(read_i32(&mut buf).unwrap(), -42);
        assert_eq!(read_i64(&mut buf).unwrap(), 123456789);
        assert_eq!(read_f32(&mut buf).unwrap(), 1.5);
        assert_eq!(read_f64(&mut buf).unwrap(), -2.25);
        assert!(read_bool(&mut buf).unwrap());
    }

    #[test]
    fn not_enough_data_is_an_error_not_a_panic() {
        let mut buf = BytesMut::from(&b"\x00"[..]);
        assert!(read_i32(&mut buf).is_err());
    }
}
