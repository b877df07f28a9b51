//! Walks table b-trees, hiding the fact that a table spans several pages.
//!
//! Traversal is a depth-first pre-order walk: interior cells are visited in
//! pointer-array order, each left child recursively, then the right-most
//! child.  For a well-formed table this yields rows in ascending rowid order.
//! Rows are delivered to a sink callback; the tree depth bounds the
//! recursion, so a scan holds O(depth) pages at a time.

use byteorder::{BigEndian, ByteOrder};
use std::collections::BTreeSet;
use std::ops::Bound::{Excluded, Included, Unbounded};

use tracing::debug;

use super::cell::cell_pointers;
use super::header::PageHeader;
use super::{Error, PageType, RowId};
use crate::pager::{PageNum, Pager};

/// A sink receives each `(rowid, record payload)` pair in traversal order.
/// Returning an error aborts the scan.
pub type RowSink<'s> = dyn FnMut(RowId, &[u8]) -> Result<(), Error> + 's;

/// Full scan: feed every row of the table rooted at `root` to `sink`.
pub fn scan(pager: &Pager, root: PageNum, sink: &mut RowSink) -> Result<(), Error> {
    scan_page(pager, root, &mut |_, _| true, sink)
}

/// Filtered scan: feed only rows whose rowid is in `targets` to `sink`.
///
/// Interior cells carry the largest rowid of their left subtree, so a
/// subtree whose rowid range contains no target is skipped without reading
/// its pages.
pub fn scan_rowids(
    pager: &Pager,
    root: PageNum,
    targets: &BTreeSet<RowId>,
    sink: &mut RowSink,
) -> Result<(), Error> {
    if targets.is_empty() {
        return Ok(());
    }
    let mut filtered = |rowid: RowId, payload: &[u8]| -> Result<(), Error> {
        if targets.contains(&rowid) {
            return sink(rowid, payload);
        }
        Ok(())
    };
    scan_page(
        pager,
        root,
        &mut |lower, upper| {
            // The subtree holds rowids in (lower, upper]; probe the target
            // set for any rowid in that range.
            match (lower, upper) {
                (None, None) => true,
                (None, Some(u)) => targets.range(..=u).next().is_some(),
                (Some(l), None) => targets.range((Excluded(l), Unbounded)).next().is_some(),
                (Some(l), Some(u)) => targets.range((Excluded(l), Included(u))).next().is_some(),
            }
        },
        &mut filtered,
    )
}

// Shared traversal.  `descend(lower, upper)` is consulted before entering a
// subtree covering rowids in (lower, upper]; `None` bounds are unbounded.
fn scan_page(
    pager: &Pager,
    pgnum: PageNum,
    descend: &mut dyn FnMut(Option<RowId>, Option<RowId>) -> bool,
    sink: &mut RowSink,
) -> Result<(), Error> {
    let page = pager.get_page(pgnum)?;
    let off = Pager::btree_start_offset(pgnum);
    let hdr = PageHeader::parse(&page, off)?;
    let ptrs = cell_pointers(&page, off, &hdr)?;
    match hdr.page_type {
        PageType::TableLeaf => {
            for p in ptrs {
                let (rowid, payload) = leaf_table_cell(&page, p)?;
                sink(rowid, payload)?;
            }
            Ok(())
        }
        PageType::TableInterior => {
            let mut lower: Option<RowId> = None;
            for p in ptrs {
                let (left_child, key) = interior_table_cell(&page, p)?;
                if descend(lower, Some(key)) {
                    scan_page(pager, left_child as PageNum, descend, sink)?;
                } else {
                    debug!(page = left_child, "skipping subtree, no matching rowids");
                }
                lower = Some(key);
            }
            let rightmost = hdr
                .rightmost_pointer
                .expect("Interior pages always have a rightmost pointer.");
            if descend(lower, None) {
                scan_page(pager, rightmost as PageNum, descend, sink)?;
            }
            Ok(())
        }
        t => Err(Error::UnexpectedPageType(t)),
    }
}

/// Count the rows of the table rooted at `root` by summing leaf cell counts
/// across the whole subtree.  Counting the root page alone would undercount
/// any table deep enough to have an interior root.
pub fn count_rows(pager: &Pager, pgnum: PageNum) -> Result<u64, Error> {
    let page = pager.get_page(pgnum)?;
    let off = Pager::btree_start_offset(pgnum);
    let hdr = PageHeader::parse(&page, off)?;
    match hdr.page_type {
        PageType::TableLeaf => Ok(hdr.num_cells as u64),
        PageType::TableInterior => {
            let ptrs = cell_pointers(&page, off, &hdr)?;
            let mut total = 0_u64;
            for p in ptrs {
                let (left_child, _) = interior_table_cell(&page, p)?;
                total += count_rows(pager, left_child as PageNum)?;
            }
            let rightmost = hdr
                .rightmost_pointer
                .expect("Interior pages always have a rightmost pointer.");
            total += count_rows(pager, rightmost as PageNum)?;
            Ok(total)
        }
        t => Err(Error::UnexpectedPageType(t)),
    }
}

// Table B-Tree Leaf Cell (page type 0x0d):
// A varint which is the total number of bytes of payload, including any overflow.
// A varint which is the integer key, a.k.a. "rowid".
// The initial portion of the payload that does not spill to overflow pages.
fn leaf_table_cell(page: &[u8], offset: usize) -> Result<(RowId, &[u8]), Error> {
    let (payload_size, n1) = crate::varint::read_varint(&page[offset..])?;
    let (rowid, n2) = crate::varint::read_varint(&page[offset + n1..])?;
    let body = offset + n1 + n2;
    let end = body + payload_size as usize;
    if end > page.len() {
        // A payload that does not fit on its page continues on overflow
        // pages, which this engine does not read.
        return Err(Error::OverflowPayload);
    }
    Ok((rowid as RowId, &page[body..end]))
}

// Table B-Tree Interior Cell (page type 0x05):
// A 4-byte big-endian page number which is the left child pointer.
// A varint which is the integer key.  All rowids in the left child are <= the key.
fn interior_table_cell(page: &[u8], offset: usize) -> Result<(u32, RowId), Error> {
    if offset + 4 > page.len() {
        return Err(Error::CellOutOfBounds);
    }
    let left_child = BigEndian::read_u32(&page[offset..offset + 4]);
    let (key, _) = crate::varint::read_varint(&page[offset + 4..])?;
    Ok((left_child, key as RowId))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaf_table_cell() {
        // payload_size 3, rowid 7.  The payload bytes are opaque here; the
        // cell reader does not interpret them.
        let mut page = vec![0_u8; 64];
        page[10] = 3; // payload size
        page[11] = 7; // rowid
        page[12..15].copy_from_slice(&[0xaa, 0xbb, 0xcc]);
        let (rowid, payload) = leaf_table_cell(&page, 10).unwrap();
        assert_eq!(rowid, 7);
        assert_eq!(payload, &[0xaa, 0xbb, 0xcc]);
    }

    #[test]
    fn test_leaf_table_cell_overflow() {
        // payload_size runs past the end of the page.
        let mut page = vec![0_u8; 16];
        page[14] = 5;
        page[15] = 1;
        assert!(matches!(
            leaf_table_cell(&page, 14),
            Err(Error::OverflowPayload)
        ));
    }

    #[test]
    fn test_interior_table_cell() {
        let mut page = vec![0_u8; 32];
        page[4..8].copy_from_slice(&9_u32.to_be_bytes());
        page[8..10].copy_from_slice(&[0x87, 0x68]); // varint 1000
        let (left, key) = interior_table_cell(&page, 4).unwrap();
        assert_eq!(left, 9);
        assert_eq!(key, 1000);
    }
}
