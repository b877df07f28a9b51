//! Builds well-formed database images byte-by-byte for the integration
//! tests.  Layouts follow the file format: a 100-byte file header on page 1,
//! b-tree page headers, cell pointer arrays in key order, and cells packed
//! at the tail of each page.

use std::io::Write;

use readlite::sql_value::SqlValue;
use readlite::varint::write_varint;

pub const MAGIC: &[u8] = b"SQLite format 3\0";

/// Encode a record: header of serial-type varints, then the column bodies.
pub fn record(values: &[SqlValue]) -> Vec<u8> {
    let mut serials: Vec<Vec<u8>> = Vec::new();
    let mut bodies: Vec<u8> = Vec::new();
    for v in values {
        let (code, mut body) = encode_value(v);
        serials.push(write_varint(code));
        bodies.append(&mut body);
    }
    let serials_len: usize = serials.iter().map(|s| s.len()).sum();
    // Header length includes its own varint; all test headers stay short
    // enough for a one-byte length.
    let header_len = serials_len + 1;
    assert!(header_len < 128, "test record header too long");
    let mut out = Vec::with_capacity(header_len + bodies.len());
    out.push(header_len as u8);
    for s in serials {
        out.extend_from_slice(&s);
    }
    out.extend_from_slice(&bodies);
    out
}

fn encode_value(v: &SqlValue) -> (u64, Vec<u8>) {
    match v {
        SqlValue::Null => (0, vec![]),
        SqlValue::Int(i) => {
            let b = i.to_be_bytes();
            if (-128..128).contains(i) {
                (1, b[7..].to_vec())
            } else if (-32768..32768).contains(i) {
                (2, b[6..].to_vec())
            } else if (-(1_i64 << 23)..(1_i64 << 23)).contains(i) {
                (3, b[5..].to_vec())
            } else if (i32::MIN as i64..=i32::MAX as i64).contains(i) {
                (4, b[4..].to_vec())
            } else if (-(1_i64 << 47)..(1_i64 << 47)).contains(i) {
                (5, b[2..].to_vec())
            } else {
                (6, b.to_vec())
            }
        }
        SqlValue::Real(f) => (7, f.to_be_bytes().to_vec()),
        SqlValue::Text(s) => (13 + 2 * s.len() as u64, s.as_bytes().to_vec()),
        SqlValue::Blob(b) => (12 + 2 * b.len() as u64, b.clone()),
    }
}

/// Shorthand for a schema-table record.
pub fn schema_record(
    kind: &str,
    name: &str,
    tbl_name: &str,
    root_page: i64,
    sql: Option<&str>,
) -> Vec<SqlValue> {
    vec![
        SqlValue::Text(String::from(kind)),
        SqlValue::Text(String::from(name)),
        SqlValue::Text(String::from(tbl_name)),
        SqlValue::Int(root_page),
        match sql {
            Some(s) => SqlValue::Text(String::from(s)),
            None => SqlValue::Null,
        },
    ]
}

// Core page assembly: header, pointer array in cell order, cells packed at
// the page tail in reverse order.
fn build_page(
    page_size: usize,
    first_page: bool,
    type_byte: u8,
    rightmost: Option<u32>,
    cells: &[Vec<u8>],
) -> Vec<u8> {
    let mut page = vec![0_u8; page_size];
    let base = if first_page { 100 } else { 0 };
    let hdr_size = if rightmost.is_some() { 12 } else { 8 };

    let mut offset = page_size;
    let mut pointers: Vec<u16> = Vec::new();
    for cell in cells {
        offset -= cell.len();
        page[offset..offset + cell.len()].copy_from_slice(cell);
        pointers.push(offset as u16);
    }
    assert!(
        offset >= base + hdr_size + 2 * cells.len(),
        "test page overfull"
    );

    page[base] = type_byte;
    page[base + 3..base + 5].copy_from_slice(&(cells.len() as u16).to_be_bytes());
    page[base + 5..base + 7].copy_from_slice(&(offset as u16).to_be_bytes());
    if let Some(r) = rightmost {
        page[base + 8..base + 12].copy_from_slice(&r.to_be_bytes());
    }
    for (i, p) in pointers.iter().enumerate() {
        let at = base + hdr_size + 2 * i;
        page[at..at + 2].copy_from_slice(&p.to_be_bytes());
    }
    page
}

/// Leaf table page: cells are `(rowid, record)`.
pub fn leaf_table_page(
    page_size: usize,
    first_page: bool,
    rows: &[(i64, Vec<u8>)],
) -> Vec<u8> {
    let cells: Vec<Vec<u8>> = rows
        .iter()
        .map(|(rowid, rec)| {
            let mut c = write_varint(rec.len() as u64);
            c.extend_from_slice(&write_varint(*rowid as u64));
            c.extend_from_slice(rec);
            c
        })
        .collect();
    build_page(page_size, first_page, 0x0d, None, &cells)
}

/// Interior table page: cells are `(left_child, largest rowid in child)`.
pub fn interior_table_page(
    page_size: usize,
    first_page: bool,
    children: &[(u32, i64)],
    rightmost: u32,
) -> Vec<u8> {
    let cells: Vec<Vec<u8>> = children
        .iter()
        .map(|(left, key)| {
            let mut c = left.to_be_bytes().to_vec();
            c.extend_from_slice(&write_varint(*key as u64));
            c
        })
        .collect();
    build_page(page_size, first_page, 0x05, Some(rightmost), &cells)
}

/// Leaf index page: cells are entry records (key columns then rowid).
pub fn leaf_index_page(page_size: usize, entries: &[Vec<u8>]) -> Vec<u8> {
    let cells: Vec<Vec<u8>> = entries
        .iter()
        .map(|rec| {
            let mut c = write_varint(rec.len() as u64);
            c.extend_from_slice(rec);
            c
        })
        .collect();
    build_page(page_size, false, 0x0a, None, &cells)
}

/// Interior index page: cells are `(left_child, entry record)`.
pub fn interior_index_page(
    page_size: usize,
    children: &[(u32, Vec<u8>)],
    rightmost: u32,
) -> Vec<u8> {
    let cells: Vec<Vec<u8>> = children
        .iter()
        .map(|(left, rec)| {
            let mut c = left.to_be_bytes().to_vec();
            c.extend_from_slice(&write_varint(rec.len() as u64));
            c.extend_from_slice(rec);
            c
        })
        .collect();
    build_page(page_size, false, 0x02, Some(rightmost), &cells)
}

/// Assemble the file: stamp the 100-byte header into page 1 and concatenate.
/// `pages[0]` must have been built with `first_page = true`.
pub fn db_file(page_size: usize, mut pages: Vec<Vec<u8>>) -> Vec<u8> {
    let mut h = vec![0_u8; 100];
    h[..16].copy_from_slice(MAGIC);
    let size_field: u16 = if page_size == 65536 { 1 } else { page_size as u16 };
    h[16..18].copy_from_slice(&size_field.to_be_bytes());
    h[18] = 1; // file format write version
    h[19] = 1; // file format read version
    h[21] = 64;
    h[22] = 32;
    h[23] = 32;
    h[24..28].copy_from_slice(&1_u32.to_be_bytes()); // change counter
    h[28..32].copy_from_slice(&(pages.len() as u32).to_be_bytes());
    h[44..48].copy_from_slice(&4_u32.to_be_bytes()); // schema format
    h[56..60].copy_from_slice(&1_u32.to_be_bytes()); // text encoding: UTF-8
    h[92..96].copy_from_slice(&1_u32.to_be_bytes());
    h[96..100].copy_from_slice(&3037000_u32.to_be_bytes());
    pages[0][..100].copy_from_slice(&h);

    let mut out = Vec::with_capacity(page_size * pages.len());
    for p in pages {
        assert_eq!(p.len(), page_size);
        out.extend_from_slice(&p);
    }
    out
}

/// Write an image to a temp file and return the handle (keeping it alive
/// keeps the file on disk) plus its path.
pub fn write_db(image: &[u8]) -> (tempfile::NamedTempFile, String) {
    let mut f = tempfile::NamedTempFile::new().expect("Should have created temp file.");
    f.write_all(image).expect("Should have written db image.");
    f.flush().expect("Should have flushed db image.");
    let path = f.path().to_str().expect("utf-8 temp path").to_string();
    (f, path)
}
