//! Reads the cell pointer array of a b-tree page.
//!
//! The cell pointer array immediately follows the page header: `num_cells`
//! 2-byte big-endian offsets, each relative to the start of the physical
//! page, arranged in key order.  The cell's length is not stored; each cell
//! format implies its own length via its varints, so this module only hands
//! out offsets.

use byteorder::{BigEndian, ReadBytesExt};
use std::io::{Cursor, Seek, SeekFrom};

use super::header::PageHeader;
use super::Error;

/// Returns the cell offsets of a page, in pointer-array (key) order.
///
/// Every offset is checked to land within `[header_end, page_len)`; a pointer
/// outside that range means the page is corrupt.
pub fn cell_pointers(page: &[u8], hdr_offset: usize, hdr: &PageHeader) -> Result<Vec<usize>, Error> {
    let array_start = hdr_offset + hdr.size();
    let header_end = array_start + 2 * hdr.num_cells as usize;
    if header_end > page.len() {
        return Err(Error::CellOutOfBounds);
    }
    let mut c = Cursor::new(page);
    c.seek(SeekFrom::Start(array_start as u64))
        .map_err(|_| Error::CellOutOfBounds)?;
    let mut pointers = Vec::with_capacity(hdr.num_cells as usize);
    for _ in 0..hdr.num_cells {
        let off = c
            .read_u16::<BigEndian>()
            .map_err(|_| Error::CellOutOfBounds)? as usize;
        if off < header_end || off >= page.len() {
            return Err(Error::CellOutOfBounds);
        }
        pointers.push(off);
    }
    Ok(pointers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_pointers() {
        let mut page = vec![0_u8; 512];
        page[0] = 0x0d;
        page[3..5].copy_from_slice(&2_u16.to_be_bytes());
        // Pointer array at offset 8: cells at 0x01f0 and 0x01e0.
        page[8..10].copy_from_slice(&0x01f0_u16.to_be_bytes());
        page[10..12].copy_from_slice(&0x01e0_u16.to_be_bytes());
        let hdr = PageHeader::parse(&page, 0).unwrap();
        let ptrs = cell_pointers(&page, 0, &hdr).unwrap();
        assert_eq!(ptrs, vec![0x01f0, 0x01e0]);
    }

    #[test]
    fn test_cell_pointer_out_of_bounds() {
        let mut page = vec![0_u8; 512];
        page[0] = 0x0d;
        page[3..5].copy_from_slice(&1_u16.to_be_bytes());
        // Pointer past the end of the page.
        page[8..10].copy_from_slice(&0x0300_u16.to_be_bytes());
        let hdr = PageHeader::parse(&page, 0).unwrap();
        assert!(matches!(
            cell_pointers(&page, 0, &hdr),
            Err(Error::CellOutOfBounds)
        ));

        // Pointer into the header area.
        page[8..10].copy_from_slice(&0x0004_u16.to_be_bytes());
        assert!(matches!(
            cell_pointers(&page, 0, &hdr),
            Err(Error::CellOutOfBounds)
        ));
    }
}
