//! Types and methods for b-tree page headers.

use byteorder::{BigEndian, ReadBytesExt};
use std::io::{Cursor, Seek, SeekFrom};

use super::{Error, PageType};

/// The parsed header of one b-tree page.
#[derive(Debug, Clone)]
pub struct PageHeader {
    pub page_type: PageType,
    pub freeblock_start: u16,
    pub num_cells: u16,
    pub cell_content_start: u32,
    /// Present on interior pages only.
    pub rightmost_pointer: Option<u32>,
}

impl PageHeader {
    /// The number of header bytes: 12 on interior pages, 8 on leaves.
    pub fn size(&self) -> usize {
        match self.rightmost_pointer {
            Some(_) => 12,
            None => 8,
        }
    }

    /// Parse the header found at `offset` within `page`.
    ///
    /// `offset` is 100 for page 1 (past the file header) and 0 for all other
    /// pages; see `Pager::btree_start_offset`.
    pub fn parse(page: &[u8], offset: usize) -> Result<PageHeader, Error> {
        let mut c = Cursor::new(page);
        c.seek(SeekFrom::Start(offset as u64))
            .map_err(|_| Error::CellOutOfBounds)?;

        // Offset	Size	Description
        // 0	1	The one-byte flag at offset 0 indicating the b-tree page type.
        let page_type = match c.read_u8().map_err(|_| Error::CellOutOfBounds)? {
            0x02 => PageType::IndexInterior,
            0x05 => PageType::TableInterior,
            0x0a => PageType::IndexLeaf,
            0x0d => PageType::TableLeaf,
            b => return Err(Error::InvalidPageType(b)),
        };
        // 1	2	The two-byte integer at offset 1 gives the start of the first freeblock on the page, or is zero if there are no freeblocks.
        let freeblock_start = c
            .read_u16::<BigEndian>()
            .map_err(|_| Error::CellOutOfBounds)?;
        // 3	2	The two-byte integer at offset 3 gives the number of cells on the page.
        let num_cells = c
            .read_u16::<BigEndian>()
            .map_err(|_| Error::CellOutOfBounds)?;
        // 5	2	The two-byte integer at offset 5 designates the start of the cell content area. A zero value for this integer is interpreted as 65536.
        let cell_content_start: u32 = match c
            .read_u16::<BigEndian>()
            .map_err(|_| Error::CellOutOfBounds)?
        {
            0 => 65536,
            x => x as u32,
        };
        // 7	1	The one-byte integer at offset 7 gives the number of fragmented free bytes within the cell content area.
        let _fragmented_free_bytes = c.read_u8().map_err(|_| Error::CellOutOfBounds)?;
        // 8	4	The four-byte page number at offset 8 is the right-most pointer. This value appears in the header of interior b-tree pages only and is omitted from all other pages.
        let rightmost_pointer = match page_type {
            PageType::IndexInterior | PageType::TableInterior => Some(
                c.read_u32::<BigEndian>()
                    .map_err(|_| Error::CellOutOfBounds)?,
            ),
            PageType::IndexLeaf | PageType::TableLeaf => None,
        };

        Ok(PageHeader {
            page_type,
            freeblock_start,
            num_cells,
            cell_content_start,
            rightmost_pointer,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_leaf_header() {
        // Leaf table page, 2 cells, content starts at 0x0ff0.
        let mut page = vec![0_u8; 4096];
        page[0] = 0x0d;
        page[3..5].copy_from_slice(&2_u16.to_be_bytes());
        page[5..7].copy_from_slice(&0x0ff0_u16.to_be_bytes());
        let h = PageHeader::parse(&page, 0).unwrap();
        assert_eq!(h.page_type, PageType::TableLeaf);
        assert_eq!(h.num_cells, 2);
        assert_eq!(h.cell_content_start, 0x0ff0);
        assert_eq!(h.rightmost_pointer, None);
        assert_eq!(h.size(), 8);
    }

    #[test]
    fn test_parse_interior_header_with_offset() {
        // Interior table page in position 1: header begins at offset 100.
        let mut page = vec![0_u8; 4096];
        page[100] = 0x05;
        page[103..105].copy_from_slice(&3_u16.to_be_bytes());
        page[108..112].copy_from_slice(&7_u32.to_be_bytes());
        let h = PageHeader::parse(&page, 100).unwrap();
        assert_eq!(h.page_type, PageType::TableInterior);
        assert_eq!(h.num_cells, 3);
        assert_eq!(h.rightmost_pointer, Some(7));
        assert_eq!(h.size(), 12);
    }

    #[test]
    fn test_parse_header_bad_type() {
        let mut page = vec![0_u8; 512];
        page[0] = 0x42;
        assert!(matches!(
            PageHeader::parse(&page, 0),
            Err(Error::InvalidPageType(0x42))
        ));
    }
}
