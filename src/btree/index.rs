//! Probes index b-trees for entries whose leading key equals a value.
//!
//! Index entries are records whose last column is the rowid of the table row
//! they point at.  Interior index cells carry a full `(key, rowid)` entry of
//! their own in addition to the left child pointer, so an equality probe must
//! collect those too.  Keys are compared byte-wise; that matches the file
//! format's default collation and is the only collation this engine speaks.

use byteorder::{BigEndian, ByteOrder};
use std::cmp::Ordering;

use tracing::debug;

use super::cell::cell_pointers;
use super::header::PageHeader;
use super::{Error, PageType, RowId};
use crate::pager::{PageNum, Pager};
use crate::record::parse_record;
use crate::sql_value::SqlValue;

/// Return the rowids of every index entry whose leading key equals `key`,
/// in ascending (key, rowid) order.  Empty when nothing matches.
pub fn find_rowids(pager: &Pager, root: PageNum, key: &str) -> Result<Vec<RowId>, Error> {
    let mut rowids = Vec::new();
    probe(pager, root, key, &mut rowids)?;
    debug!(matches = rowids.len(), "index probe finished");
    Ok(rowids)
}

fn probe(pager: &Pager, pgnum: PageNum, key: &str, out: &mut Vec<RowId>) -> Result<(), Error> {
    let page = pager.get_page(pgnum)?;
    let off = Pager::btree_start_offset(pgnum);
    let hdr = PageHeader::parse(&page, off)?;
    let ptrs = cell_pointers(&page, off, &hdr)?;
    match hdr.page_type {
        PageType::IndexLeaf => {
            // Duplicate keys may straddle page boundaries, so the whole leaf
            // is scanned; the interior descent bounds which leaves we visit.
            for p in ptrs {
                let payload = leaf_index_cell(&page, p)?;
                let entry = parse_record(payload)?;
                if compare_leading_key(&entry, key)? == Ordering::Equal {
                    out.push(entry_rowid(&entry)?);
                }
            }
            Ok(())
        }
        PageType::IndexInterior => {
            // Cells are ordered ascending by key.  Entries equal to a cell's
            // own key can sit in its left child (smaller rowid), in the cell
            // itself, or further right (larger rowid), so equality descends
            // left, collects the cell's rowid, and keeps scanning.
            for p in ptrs {
                let (left_child, payload) = interior_index_cell(&page, p)?;
                let entry = parse_record(payload)?;
                match compare_leading_key(&entry, key)? {
                    Ordering::Greater => {
                        // cell key > probe: everything at and past this cell
                        // is too large; the left child bounds the search.
                        probe(pager, left_child as PageNum, key, out)?;
                        return Ok(());
                    }
                    Ordering::Equal => {
                        probe(pager, left_child as PageNum, key, out)?;
                        out.push(entry_rowid(&entry)?);
                    }
                    Ordering::Less => {}
                }
            }
            let rightmost = hdr
                .rightmost_pointer
                .expect("Interior pages always have a rightmost pointer.");
            probe(pager, rightmost as PageNum, key, out)
        }
        t => Err(Error::UnexpectedPageType(t)),
    }
}

// Byte-wise order of the entry's leading key relative to `key`.
// Non-text leading keys (NULL, numeric) never equal a text probe; they sort
// as Less so interior descent keeps moving right past them, matching the
// format's NULL-first ordering for the types this engine compares.
fn compare_leading_key(entry: &[SqlValue], key: &str) -> Result<Ordering, Error> {
    let leading = entry.first().ok_or(Error::MalformedIndexEntry)?;
    match leading.as_text() {
        Some(t) => Ok(t.as_bytes().cmp(key.as_bytes())),
        None => Ok(Ordering::Less),
    }
}

// The rowid of the referenced table row is the entry's last column.
fn entry_rowid(entry: &[SqlValue]) -> Result<RowId, Error> {
    if entry.len() < 2 {
        return Err(Error::MalformedIndexEntry);
    }
    entry
        .last()
        .and_then(|v| v.as_int())
        .copied()
        .ok_or(Error::MalformedIndexEntry)
}

// Index B-Tree Leaf Cell (page type 0x0a):
// A varint which is the total number of bytes of key payload, including any overflow.
// The initial portion of the payload that does not spill to overflow pages.
fn leaf_index_cell(page: &[u8], offset: usize) -> Result<&[u8], Error> {
    let (payload_size, n) = crate::varint::read_varint(&page[offset..])?;
    let body = offset + n;
    let end = body + payload_size as usize;
    if end > page.len() {
        return Err(Error::OverflowPayload);
    }
    Ok(&page[body..end])
}

// Index B-Tree Interior Cell (page type 0x02):
// A 4-byte big-endian page number which is the left child pointer.
// A varint which is the total number of bytes of key payload, including any overflow.
// The initial portion of the payload that does not spill to overflow pages.
fn interior_index_cell(page: &[u8], offset: usize) -> Result<(u32, &[u8]), Error> {
    if offset + 4 > page.len() {
        return Err(Error::CellOutOfBounds);
    }
    let left_child = BigEndian::read_u32(&page[offset..offset + 4]);
    let (payload_size, n) = crate::varint::read_varint(&page[offset + 4..])?;
    let body = offset + 4 + n;
    let end = body + payload_size as usize;
    if end > page.len() {
        return Err(Error::OverflowPayload);
    }
    Ok((left_child, &page[body..end]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_leading_key() {
        let entry = vec![SqlValue::Text(String::from("Fuji")), SqlValue::Int(2)];
        assert_eq!(
            compare_leading_key(&entry, "Fuji").unwrap(),
            Ordering::Equal
        );
        assert_eq!(
            compare_leading_key(&entry, "Gala").unwrap(),
            Ordering::Less
        );
        assert_eq!(
            compare_leading_key(&entry, "Envy").unwrap(),
            Ordering::Greater
        );
        // Case matters: comparison is byte-wise, not a collation.
        assert_eq!(
            compare_leading_key(&entry, "fuji").unwrap(),
            Ordering::Less
        );
        // A NULL leading key never matches and sorts low.
        let null_entry = vec![SqlValue::Null, SqlValue::Int(3)];
        assert_eq!(
            compare_leading_key(&null_entry, "Fuji").unwrap(),
            Ordering::Less
        );
    }

    #[test]
    fn test_entry_rowid() {
        let entry = vec![SqlValue::Text(String::from("Fuji")), SqlValue::Int(2)];
        assert_eq!(entry_rowid(&entry).unwrap(), 2);
        // An entry without a trailing integer rowid is malformed.
        assert!(entry_rowid(&[SqlValue::Int(2)]).is_err());
        let bad = vec![
            SqlValue::Text(String::from("Fuji")),
            SqlValue::Text(String::from("x")),
        ];
        assert!(entry_rowid(&bad).is_err());
    }

    #[test]
    fn test_leaf_index_cell() {
        let mut page = vec![0_u8; 32];
        page[5] = 4;
        page[6..10].copy_from_slice(&[1, 2, 3, 4]);
        assert_eq!(leaf_index_cell(&page, 5).unwrap(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_interior_index_cell() {
        let mut page = vec![0_u8; 32];
        page[8..12].copy_from_slice(&3_u32.to_be_bytes());
        page[12] = 2;
        page[13..15].copy_from_slice(&[0xaa, 0xbb]);
        let (left, payload) = interior_index_cell(&page, 8).unwrap();
        assert_eq!(left, 3);
        assert_eq!(payload, &[0xaa, 0xbb]);
    }
}
