//! Serial types are how the file format stores values.
//! Each column in a record header carries a serial type code that determines
//! both the kind of value and the exact number of body bytes it occupies.

use byteorder::BigEndian;
use byteorder::ReadBytesExt;
use std::io::Read;

use crate::sql_value::SqlValue;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Error reading value bytes: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serial type code {0} is reserved for internal use.")]
    ReservedTypeCode(i64),
    #[error("Invalid serial type code {0}.")]
    InvalidTypeCode(i64),
    #[error("Bytes were not a valid string encoding.")]
    InvalidStringEncoding(#[from] std::string::FromUtf8Error),
}

/// Returns the length in bytes of the body implied by a serial type code.
///
/// Reserved codes 10 and 11 and negative codes are errors: they never appear
/// in a well-formed database file.
pub fn serialized_size(serial_type: i64) -> Result<usize, Error> {
    match serial_type {
        // Serial Type	Content Size	Meaning
        // 0	        0	            Value is a NULL.
        0 => Ok(0),
        // 1	        1	            Value is an 8-bit twos-complement integer.
        // 2	        2	            Value is a big-endian 16-bit twos-complement integer.
        // 3	        3	            Value is a big-endian 24-bit twos-complement integer.
        // 4	        4	            Value is a big-endian 32-bit twos-complement integer.
        1..=4 => Ok(serial_type as usize),
        // 5	        6	            Value is a big-endian 48-bit twos-complement integer.
        5 => Ok(6),
        // 6	        8	            Value is a big-endian 64-bit twos-complement integer.
        // 7	        8	            Value is a big-endian IEEE 754-2008 64-bit floating point number.
        6 | 7 => Ok(8),
        // 8	        0	            Value is the integer 0.
        // 9	        0	            Value is the integer 1.
        8 | 9 => Ok(0),
        // 10,11	    variable	    Reserved for internal use.
        10 | 11 => Err(Error::ReservedTypeCode(serial_type)),
        // N≥12 & even	(N-12)/2	    Value is a BLOB that is (N-12)/2 bytes in length.
        // N≥13 & odd	(N-13)/2	    Value is a string in the text encoding and (N-13)/2 bytes in length.
        x if x >= 12 => Ok((x as usize - 12 - (x % 2) as usize) / 2),
        x => Err(Error::InvalidTypeCode(x)),
    }
}

/// Deserialize a value body into a [`SqlValue`].
///
/// # Arguments
///
/// * `serial_type` - the serial type code from the record header.
/// * `data` - the body bytes; must be at least `serialized_size(serial_type)` long.
///
/// Multi-byte integers are big-endian twos-complement; 24-bit and 48-bit
/// widths are sign-extended to `i64`.  Text is decoded as UTF-8, the only
/// encoding the engine supports (checked when the file is opened).
pub fn to_sql_value(serial_type: i64, data: &[u8]) -> Result<SqlValue, Error> {
    use SqlValue::*;

    let mut c = std::io::Cursor::new(data);
    match serial_type {
        0 => Ok(Null),
        1 => Ok(Int(c.read_i8()? as i64)),
        2 => Ok(Int(c.read_i16::<BigEndian>()? as i64)),
        3 => Ok(Int(read_sign_extended(&mut c, 3)?)),
        4 => Ok(Int(c.read_i32::<BigEndian>()? as i64)),
        5 => Ok(Int(read_sign_extended(&mut c, 6)?)),
        6 => Ok(Int(c.read_i64::<BigEndian>()?)),
        7 => Ok(Real(c.read_f64::<BigEndian>()?)),
        8 => Ok(Int(0)),
        9 => Ok(Int(1)),
        10 | 11 => Err(Error::ReservedTypeCode(serial_type)),
        x if x >= 12 && x % 2 == 0 => {
            let mut buf = vec![0_u8; (x as usize - 12) / 2];
            c.read_exact(&mut buf[..])?;
            Ok(Blob(buf))
        }
        x if x >= 13 => {
            let mut buf = vec![0_u8; (x as usize - 13) / 2];
            c.read_exact(&mut buf[..])?;
            Ok(Text(String::from_utf8(buf)?))
        }
        x => Err(Error::InvalidTypeCode(x)),
    }
}

// Reads an `nbytes`-wide big-endian twos-complement integer and sign-extends
// it to i64.  Used for the 24-bit and 48-bit widths byteorder has no reader for.
fn read_sign_extended(c: &mut std::io::Cursor<&[u8]>, nbytes: usize) -> Result<i64, Error> {
    let mut bytes = [0_u8; 8];
    c.read_exact(&mut bytes[8 - nbytes..])?;
    let fill = match bytes[8 - nbytes] & 0x80 {
        0 => 0x00,
        _ => 0xff,
    };
    for b in bytes[..8 - nbytes].iter_mut() {
        *b = fill;
    }
    Ok(i64::from_be_bytes(bytes))
}

#[test]
fn test_serialized_size() {
    let cases: Vec<(i64, usize)> = vec![
        (0, 0),
        (1, 1),
        (2, 2),
        (3, 3),
        (4, 4),
        (5, 6),
        (6, 8),
        (7, 8),
        (8, 0),
        (9, 0),
        (12, 0),  // empty blob
        (13, 0),  // empty string
        (18, 3),  // 3-byte blob
        (19, 3),  // 3-byte string
        (25, 6),  // 6-byte string
    ];
    for (i, case) in cases.iter().enumerate() {
        println!("Testing case {}: size of typecode {}", i, case.0);
        assert_eq!(serialized_size(case.0).unwrap(), case.1);
    }
    for bad in [-1_i64, -12345, 10, 11] {
        assert!(serialized_size(bad).is_err());
    }
}

#[test]
fn test_to_sql_value() {
    use SqlValue::*;

    let cases: Vec<(i64, &[u8], SqlValue)> = vec![
        (0, b"", Null),
        // one byte ints
        (1, &[0x7f], Int(127)),
        (1, &[0xff], Int(-1)),
        (1, &[0x01], Int(1)),
        // two byte ints
        (2, &[0x00, 0x7f], Int(127)),
        (2, &[0xff, 0xff], Int(-1)),
        (2, &[0x01, 0x00], Int(256)),
        // three byte ints
        (3, &[0x00, 0x00, 0x7f], Int(127)),
        (3, &[0xff, 0xff, 0xff], Int(-1)),
        (3, &[0x01, 0x00, 0x00], Int(65536)),
        // four byte ints
        (4, &[0x7f, 0xff, 0xff, 0xff], Int(i32::MAX as i64)),
        (4, &[0xff, 0xff, 0xff, 0xff], Int(-1)),
        // six byte ints
        (5, &[0x00, 0x00, 0x00, 0x01, 0x00, 0x00], Int(65536)),
        (5, &[0xff, 0xff, 0xff, 0xff, 0xff, 0xff], Int(-1)),
        // eight byte ints
        (
            6,
            &[0x7f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff],
            Int(i64::MAX),
        ),
        // float
        (
            7,
            &[0x40, 0x09, 0x21, 0xca, 0xc0, 0x83, 0x12, 0x6f],
            Real(3.1415),
        ),
        // Literal 0 and 1
        (8, b"", Int(0)),
        (9, b"", Int(1)),
        // Text of various lengths
        (13, b"", Text(String::new())),
        (19, b"Foo", Text(String::from("Foo"))),
        (25, b"FooBar", Text(String::from("FooBar"))),
        // Blob
        (18, &[0x00_u8, 0x01, 0xff], Blob(vec![0, 1, 255])),
    ];
    for (i, case) in cases.iter().enumerate() {
        println!("Testing case {}: deserialize typecode {}", i, case.0);
        assert_eq!(to_sql_value(case.0, case.1).unwrap(), case.2);
    }
}

#[test]
fn test_to_sql_value_errors() {
    let cases: Vec<(i64, &[u8])> = vec![
        // Negative codes are invalid.
        (-1, &[0x0, 0x0]),
        (-12345, &[0x0, 0x0]),
        // Reserved codes never appear in well-formed files.
        (10, &[0x00, 0x7f]),
        (11, &[0x01, 0x00, 0x00]),
        // Body shorter than the code implies.
        (4, &[0x00]),
        (19, b"ab"),
        // Text body that is not valid UTF-8.
        (15, &[0xff]),
    ];
    for (i, case) in cases.iter().enumerate() {
        println!("Testing case {}: deserialize typecode {}, should error", i, case.0);
        assert!(to_sql_value(case.0, case.1).is_err());
    }
}
