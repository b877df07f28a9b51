//! B-tree cells hold records, the binary encoding of one row.
//!
//! A record is a header followed by a body.  The header begins with a varint
//! giving the total header length in bytes (inclusive of itself), followed by
//! one serial-type varint per column.  The body is the concatenation of the
//! column values, each occupying exactly the length its serial type implies.

use crate::serial_type;
use crate::sql_value::SqlValue;
use crate::varint;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Error decoding varint in record: {0}")]
    Varint(#[from] varint::Error),
    #[error("Error decoding value in record: {0}")]
    SerialType(#[from] serial_type::Error),
    #[error("Record header length does not line up with the serial types in it.")]
    MalformedHeader,
    #[error("Record body is shorter than its serial types imply.")]
    TruncatedBody,
}

/// Decode a full record payload into one value per column.
///
/// # Arguments
///
/// * `payload` - the record bytes, starting at the header-length varint and
///   ending at the last byte of the body.
///
/// Fails if the serial-type varints overshoot the declared header length, or
/// if the body runs out of bytes before every column is decoded.
pub fn parse_record(payload: &[u8]) -> Result<Vec<SqlValue>, Error> {
    let (hdr_len, hdr_len_len) = varint::read_varint(payload)?;
    let hdr_len = hdr_len as usize;
    if hdr_len < hdr_len_len || hdr_len > payload.len() {
        return Err(Error::MalformedHeader);
    }

    // Read serial types until they exactly fill the declared header.
    let mut serial_types: Vec<i64> = Vec::new();
    let mut offset = hdr_len_len;
    while offset < hdr_len {
        let (st, n) = varint::read_varint(&payload[offset..hdr_len])?;
        serial_types.push(st as i64);
        offset += n;
    }
    if offset != hdr_len {
        return Err(Error::MalformedHeader);
    }

    // Decode the bodies in declaration order.
    let mut values: Vec<SqlValue> = Vec::with_capacity(serial_types.len());
    let mut body_offset = hdr_len;
    for st in serial_types {
        let size = serial_type::serialized_size(st)?;
        if body_offset + size > payload.len() {
            return Err(Error::TruncatedBody);
        }
        values.push(serial_type::to_sql_value(
            st,
            &payload[body_offset..body_offset + size],
        )?);
        body_offset += size;
    }
    Ok(values)
}

#[test]
fn test_parse_record_one_literal() {
    // 2 byte record header, one column of type literal-1 (09), empty body.
    let payload: &[u8] = &[0x02, 0x09];
    assert_eq!(parse_record(payload).unwrap(), vec![SqlValue::Int(1)]);
}

#[test]
fn test_parse_record_five_one_byte_ints() {
    let payload: &[u8] = &[
        0x06, 0x01, 0x01, 0x01, 0x01, 0x01, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e,
    ];
    let expected: Vec<SqlValue> = (10..15).map(SqlValue::Int).collect();
    assert_eq!(parse_record(payload).unwrap(), expected);
}

#[test]
fn test_parse_record_various_types() {
    use SqlValue::*;
    // literal 0 | literal 1 | float 3.1415 | "Ten" | NULL
    let payload: &[u8] = &[
        0x06, 0x08, 0x09, 0x07, 0x13, 0x00, 0x40, 0x09, 0x21, 0xca, 0xc0, 0x83, 0x12, 0x6f, 0x54,
        0x65, 0x6e,
    ];
    assert_eq!(
        parse_record(payload).unwrap(),
        vec![Int(0), Int(1), Real(3.1415), Text(String::from("Ten")), Null]
    );
}

#[test]
fn test_parse_record_errors() {
    let cases: Vec<&[u8]> = vec![
        // Empty payload.
        &[],
        // Header length points past the payload.
        &[0x10, 0x09],
        // Header length zero (cannot even cover its own varint).
        &[0x00],
        // Serial types overshoot the header: declared 2 header bytes, but the
        // second byte starts a varint that is cut off by the header boundary.
        &[0x02, 0x84],
        // Reserved serial type 10.
        &[0x02, 0x0a, 0x00],
        // Body shorter than the serial types imply ("Ten" truncated).
        &[0x02, 0x13, 0x54, 0x65],
    ];
    for (i, case) in cases.iter().enumerate() {
        println!("Testing case {}: parse {:x?}, should error", i, case);
        assert!(parse_record(case).is_err());
    }
}
