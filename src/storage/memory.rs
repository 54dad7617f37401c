use std::collections::BTreeMap;

use crate::error::Result;
use crate::storage::page::{PageId, PAGE_SIZE};
use crate::storage::DiskManager;

/// An in-memory page store, backed by a BTreeMap keyed by page id.
/// Mainly for testing the buffer pool without touching the filesystem.
#[derive(Debug)]
pub struct Memory {
    pages: BTreeMap<PageId, Vec<u8>>,
}

impl Memory {
    pub fn new() -> Memory {
        Memory { pages: BTreeMap::new() }
    }
}

impl Default for Memory {
    fn default() -> Self {
        Memory::new()
    }
}

impl DiskManager for Memory {
    fn read_page(&mut self, page_id: PageId, buf: &mut [u8]) -> Result<()> {
        match self.pages.get(&page_id) {
            Some(data) => buf.copy_from_slice(data),
            None => buf.fill(0),
        }
        Ok(())
    }

    fn write_page(&mut self, page_id: PageId, buf: &[u8]) -> Result<()> {
        self.pages.insert(page_id, buf[..PAGE_SIZE].to_vec());
        Ok(())
    }

    fn deallocate_page(&mut self, page_id: PageId) -> Result<()> {
        self.pages.remove(&page_id);
        Ok(())
    }
}
