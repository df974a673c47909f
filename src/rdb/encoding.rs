use bytes::Bytes;

use crate::rdb::RdbError;

/// How the bytes after a length prefix are to be read.
#[derive(Debug, PartialEq)]
enum ValueEncoding {
    Length(usize),
    Int8,
    Int16,
    Int32,
}

/// Returns `len` bytes starting at `cursor`, or `Truncated` if the buffer
/// ends first.
pub(crate) fn take(bytes: &[u8], cursor: usize, len: usize) -> Result<&[u8], RdbError> {
    let end = cursor.checked_add(len).ok_or(RdbError::Truncated)?;

    bytes.get(cursor..end).ok_or(RdbError::Truncated)
}

pub(crate) fn take_array<const N: usize>(bytes: &[u8], cursor: usize) -> Result<[u8; N], RdbError> {
    let slice = take(bytes, cursor, N)?;
    let mut array = [0u8; N];
    array.copy_from_slice(slice);

    Ok(array)
}

/// Encodes a length with the variable-width scheme.
///
/// * `n < 2^6`: one byte, top bits `00`
/// * `n < 2^14`: two bytes, top bits `01`, remaining 14 bits big-endian
/// * otherwise: `0x80` followed by a 4-byte little-endian count
///
/// # Examples
///
/// ```ignore
/// encode_length(10)?;    // [0x0A]
/// encode_length(700)?;   // [0x42, 0xBC]
/// encode_length(17000)?; // [0x80, 0x68, 0x42, 0x00, 0x00]
/// ```
pub fn encode_length(n: usize) -> Result<Vec<u8>, RdbError> {
    if n < 1 << 6 {
        return Ok(vec![n as u8]);
    }

    if n < 1 << 14 {
        return Ok(vec![0b0100_0000 | (n >> 8) as u8, (n & 0xFF) as u8]);
    }

    let n32 = u32::try_from(n).map_err(|_| RdbError::LengthTooLarge(n))?;
    let mut encoded = Vec::with_capacity(5);
    encoded.push(0x80);
    encoded.extend_from_slice(&n32.to_le_bytes());

    Ok(encoded)
}

fn decode_encoding(bytes: &[u8]) -> Result<(ValueEncoding, usize), RdbError> {
    let first = take(bytes, 0, 1)?[0];

    // The two most significant bits select the form.
    match first >> 6 {
        0b00 => Ok((ValueEncoding::Length((first & 0b0011_1111) as usize), 1)),
        0b01 => {
            let second = take(bytes, 1, 1)?[0];
            let high = ((first & 0b0011_1111) as usize) << 8;

            Ok((ValueEncoding::Length(high | second as usize), 2))
        }
        0b10 if first == 0x80 => {
            let count = u32::from_le_bytes(take_array(bytes, 1)?);

            Ok((ValueEncoding::Length(count as usize), 5))
        }
        0b11 => match first & 0b0011_1111 {
            0 => Ok((ValueEncoding::Int8, 1)),
            1 => Ok((ValueEncoding::Int16, 1)),
            2 => Ok((ValueEncoding::Int32, 1)),
            // 3 is LZF compression.
            _ => Err(RdbError::UnsupportedEncoding(first)),
        },
        _ => Err(RdbError::UnsupportedEncoding(first)),
    }
}

/// Decodes a plain length prefix.
///
/// # Returns
///
/// * `Ok((length, used))` - The decoded length and the bytes its prefix took
/// * `Err(RdbError::Truncated)` - If the prefix is not complete yet
/// * `Err(RdbError::UnsupportedEncoding)` - If the prefix is an integer or
///   compressed string marker
pub fn decode_length(bytes: &[u8]) -> Result<(usize, usize), RdbError> {
    match decode_encoding(bytes)? {
        (ValueEncoding::Length(length), used) => Ok((length, used)),
        _ => Err(RdbError::UnsupportedEncoding(bytes[0])),
    }
}

/// Appends a length-prefixed string.
pub fn encode_string(out: &mut Vec<u8>, value: &[u8]) -> Result<(), RdbError> {
    out.extend_from_slice(&encode_length(value.len())?);
    out.extend_from_slice(value);

    Ok(())
}

/// Decodes a string, either length-prefixed or in one of the integer forms.
/// Length-prefixed strings are returned as the raw bytes.
pub fn decode_string(bytes: &[u8]) -> Result<(Bytes, usize), RdbError> {
    let (encoding, cursor) = decode_encoding(bytes)?;

    match encoding {
        ValueEncoding::Length(length) => {
            let raw = take(bytes, cursor, length)?;
            Ok((Bytes::copy_from_slice(raw), cursor + length))
        }
        ValueEncoding::Int8 => {
            let value = i8::from_le_bytes(take_array(bytes, cursor)?);
            Ok((Bytes::from(value.to_string()), cursor + 1))
        }
        ValueEncoding::Int16 => {
            let value = i16::from_le_bytes(take_array(bytes, cursor)?);
            Ok((Bytes::from(value.to_string()), cursor + 2))
        }
        ValueEncoding::Int32 => {
            let value = i32::from_le_bytes(take_array(bytes, cursor)?);
            Ok((Bytes::from(value.to_string()), cursor + 4))
        }
    }
}

/// Decodes a string that has to be UTF-8: keys and aux fields.
pub fn decode_text(bytes: &[u8]) -> Result<(String, usize), RdbError> {
    let (raw, used) = decode_string(bytes)?;
    let text = String::from_utf8(raw.to_vec()).map_err(|_| RdbError::InvalidUtf8)?;

    Ok((text, used))
}
