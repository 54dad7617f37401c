use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use log::debug;

use crate::error::Result;
use crate::storage::page::{PageId, PAGE_SIZE};
use crate::storage::DiskManager;

/// A file-backed page store. Pages live at offset page_id * PAGE_SIZE in
/// a single data file, read and written synchronously.
#[derive(Debug)]
pub struct FileDisk {
    file: File,
}

impl FileDisk {
    pub fn open(path: impl AsRef<Path>) -> Result<FileDisk> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path.as_ref())?;
        debug!("opened data file {:?}", path.as_ref());
        Ok(FileDisk { file })
    }

    fn offset(page_id: PageId) -> u64 {
        page_id as u64 * PAGE_SIZE as u64
    }
}

impl DiskManager for FileDisk {
    fn read_page(&mut self, page_id: PageId, buf: &mut [u8]) -> Result<()> {
        self.file.seek(SeekFrom::Start(Self::offset(page_id)))?;
        // pages past the end of file read back as zeros, the file only
        // grows when a page is actually written.
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.file.read(&mut buf[filled..])?;
            if n == 0 {
                buf[filled..].fill(0);
                break;
            }
            filled += n;
        }
        Ok(())
    }

    fn write_page(&mut self, page_id: PageId, buf: &[u8]) -> Result<()> {
        self.file.seek(SeekFrom::Start(Self::offset(page_id)))?;
        self.file.write_all(&buf[..PAGE_SIZE])?;
        self.file.flush()?;
        Ok(())
    }

    fn deallocate_page(&mut self, _page_id: PageId) -> Result<()> {
        // the file keeps its extent, the slot is simply rewritten the next
        // time the page id is reused.
        Ok(())
    }
}
