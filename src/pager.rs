//! Manages page access to one database file.
//!
//! The file is a sequence of equal-sized pages, numbered from 1 to match how
//! the format numbers them.  Page `n` starts at byte `(n - 1) * page_size`.
//! Page 1 additionally begins with the 100-byte file header; the b-tree
//! content of page 1 starts after it, but cell pointers on page 1 are still
//! relative to the start of the physical page.
//!
//! Pages are loaded on demand, one read per page, and cached for the life of
//! the `Pager`.  Handles are `Rc<Vec<u8>>` so that a recursive b-tree descent
//! can hold several pages at once without borrowing against the cache.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::io::{Read, Seek, SeekFrom};
use std::rc::Rc;

use tracing::trace;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Error accessing database file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Error in database header: {0}")]
    DbHdr(#[from] crate::dbheader::Error),
    #[error("Page {0} is beyond the end of the file.")]
    PageOutOfRange(PageNum),
}

// Page numbers are 1-based, to match how the file format numbers pages.
pub type PageNum = usize;

// TODO: evict cached pages under memory pressure; a full scan of a large
// table currently keeps every visited page resident.
pub struct Pager {
    f: RefCell<std::fs::File>,
    pages: RefCell<HashMap<PageNum, Rc<Vec<u8>>>>,
    page_size: u32,
    num_pages: usize,
    pages_read: Cell<usize>,
}

impl Pager {
    /// Opens a database file read-only and validates its header.
    pub fn open(path: &str) -> Result<Self, Error> {
        let mut file = std::fs::OpenOptions::new()
            .read(true)
            .write(false)
            .create(false)
            .open(path)?;
        let h = crate::dbheader::get_header_clone(&mut file)?;
        // The page count is derived from the physical file length; the
        // in-header count can be stale for files written by old libraries.
        let file_len = file.seek(SeekFrom::End(0))?;
        let num_pages = (file_len / h.pagesize as u64) as usize;
        Ok(Pager {
            f: RefCell::new(file),
            pages: RefCell::new(HashMap::new()),
            page_size: h.pagesize,
            num_pages,
            pages_read: Cell::new(0),
        })
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn num_pages(&self) -> usize {
        self.num_pages
    }

    /// Number of pages fetched from disk since open.  Cached re-reads do not
    /// count; the indexed-lookup tests assert an upper bound on this.
    pub fn pages_read(&self) -> usize {
        self.pages_read.get()
    }

    /// Returns the offset within `pagenum` at which b-tree content starts:
    /// 100 on page 1 (past the file header), 0 elsewhere.
    pub fn btree_start_offset(pagenum: PageNum) -> usize {
        match pagenum {
            1 => crate::dbheader::DB_HEADER_BYTES,
            _ => 0,
        }
    }

    /// Get a read-only handle to page `pn`, loading it on first access.
    pub fn get_page(&self, pn: PageNum) -> Result<Rc<Vec<u8>>, Error> {
        if pn == 0 || pn > self.num_pages {
            return Err(Error::PageOutOfRange(pn));
        }
        if let Some(p) = self.pages.borrow().get(&pn) {
            return Ok(Rc::clone(p));
        }
        trace!(page = pn, "reading page");
        let mut v = vec![0_u8; self.page_size as usize];
        let mut f = self.f.borrow_mut();
        f.seek(SeekFrom::Start((pn - 1) as u64 * self.page_size as u64))?;
        f.read_exact(&mut v[..])?;
        self.pages_read.set(self.pages_read.get() + 1);
        let p = Rc::new(v);
        self.pages.borrow_mut().insert(pn, Rc::clone(&p));
        Ok(p)
    }
}
