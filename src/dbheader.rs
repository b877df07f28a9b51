//! dbheader reads the 100-byte header at the start of a database file.
//!
//! Only the fields traversal depends on are validated: the magic string,
//! the page size, and the text encoding.  Everything else in the header
//! (change counters, freelist bookkeeping, schema cookies) is left alone;
//! verifying file integrity beyond what is needed to walk the requested
//! pages is not this engine's job.

use byteorder::{BigEndian, ReadBytesExt};
use std::io::{Cursor, Read, Seek, SeekFrom};

#[derive(thiserror::Error, Debug, Clone)]
pub enum Error {
    #[error("The magic bytes for this file are wrong.")]
    WrongMagic,
    #[error("The page size {0} is not valid for this file format.")]
    InvalidPagesize(u32),
    #[error("The file's text encoding is not UTF-8.")]
    UnsupportedTextEncoding,
    #[error("Error reading file.")]
    ReadFailed,
}

pub const DB_HEADER_BYTES: usize = 100;

const MAGIC_STRING: &[u8] = b"SQLite format 3\0";
const OFFSET_TEXT_ENCODING: u64 = 56;
const ENCODING_UTF8: u32 = 1;

// The fields of the file header this engine cares about.
#[derive(Debug, Clone)]
pub struct DbfileHeader {
    pub pagesize: u32,
}

pub fn get_header_clone(f: &mut std::fs::File) -> Result<DbfileHeader, Error> {
    let mut v = vec![0_u8; DB_HEADER_BYTES];
    f.seek(SeekFrom::Start(0)).map_err(|_| Error::ReadFailed)?;
    f.read_exact(&mut v[..]).map_err(|_| Error::ReadFailed)?;
    let mut c = Cursor::new(v);
    get_header(&mut c)
}

pub fn get_header<R: Read + Seek>(f: &mut R) -> Result<DbfileHeader, Error> {
    f.seek(SeekFrom::Start(0)).map_err(|_| Error::ReadFailed)?;
    // Offset	Size	Description
    // 0        16	    The header string: "SQLite format 3\000"
    let mut fileid_buffer = [0; 16];
    f.read_exact(&mut fileid_buffer)
        .map_err(|_| Error::ReadFailed)?;
    if fileid_buffer != MAGIC_STRING {
        return Err(Error::WrongMagic);
    }

    // Offset	Size	Description
    // 16	    2	    The database page size in bytes. Must be a power of two between 512 and 32768 inclusive, or the value 1 representing a page size of 65536.
    let raw_pagesize = f.read_u16::<BigEndian>().map_err(|_| Error::ReadFailed)?;
    let pagesize: u32 = match raw_pagesize {
        1 => 65536,
        x if (512..=32768).contains(&x) && x.is_power_of_two() => x as u32,
        x => return Err(Error::InvalidPagesize(x as u32)),
    };

    // Offset	Size	Description
    // 56	    4	    The database text encoding. A value of 1 means UTF-8. A value of 2 means UTF-16le. A value of 3 means UTF-16be.
    f.seek(SeekFrom::Start(OFFSET_TEXT_ENCODING))
        .map_err(|_| Error::ReadFailed)?;
    if f.read_u32::<BigEndian>().map_err(|_| Error::ReadFailed)? != ENCODING_UTF8 {
        return Err(Error::UnsupportedTextEncoding);
    }

    f.seek(SeekFrom::Start(0)).map_err(|_| Error::ReadFailed)?;
    Ok(DbfileHeader { pagesize })
}

#[cfg(test)]
fn header_bytes(pagesize_field: u16, encoding: u32) -> Vec<u8> {
    let mut h = vec![0_u8; DB_HEADER_BYTES];
    h[..16].copy_from_slice(MAGIC_STRING);
    h[16..18].copy_from_slice(&pagesize_field.to_be_bytes());
    h[56..60].copy_from_slice(&encoding.to_be_bytes());
    h
}

#[test]
fn test_get_header() {
    let cases: Vec<(u16, u32)> = vec![
        (512, 512),
        (1024, 1024),
        (4096, 4096),
        (32768, 32768),
        (1, 65536),
    ];
    for (field, expected) in cases {
        let mut c = Cursor::new(header_bytes(field, ENCODING_UTF8));
        let h = get_header(&mut c).expect("Should have parsed header.");
        assert_eq!(h.pagesize, expected);
    }
}

#[test]
fn test_get_header_errors() {
    // Wrong magic.
    let mut bad_magic = header_bytes(4096, ENCODING_UTF8);
    bad_magic[0] = b'X';
    assert!(matches!(
        get_header(&mut Cursor::new(bad_magic)),
        Err(Error::WrongMagic)
    ));

    // Page sizes that are out of range or not a power of two.
    for field in [0_u16, 2, 256, 3000, 65535] {
        let mut c = Cursor::new(header_bytes(field, ENCODING_UTF8));
        assert!(
            matches!(get_header(&mut c), Err(Error::InvalidPagesize(_))),
            "pagesize field {}",
            field
        );
    }

    // UTF-16 encodings are not supported.
    for enc in [2_u32, 3] {
        let mut c = Cursor::new(header_bytes(4096, enc));
        assert!(matches!(
            get_header(&mut c),
            Err(Error::UnsupportedTextEncoding)
        ));
    }

    // Truncated header.
    let mut c = Cursor::new(vec![0_u8; 10]);
    assert!(matches!(get_header(&mut c), Err(Error::ReadFailed)));
}
