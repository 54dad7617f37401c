use std::fmt::Debug;

use serde::Deserialize;
use serde::Serialize;

use crate::error::Result;

pub mod disk;
pub mod memory;
pub mod page;

use page::PageId;

/// A synchronous page-granular storage collaborator, addressed by page id.
/// The buffer pool is its only caller and invokes it while holding the
/// pool latch, so implementations do not need internal locking.
/// The DiskManager trait is designed as `trait object` compatible, i.e.,
/// follow the [object safety rules](https://doc.rust-lang.org/reference/items/traits.html#object-safety),
/// the buffer pool holds it as a `Box<dyn DiskManager>`.
pub trait DiskManager: Debug + Send + Sync {
    /// Read the page with the given id into buf, filling exactly
    /// PAGE_SIZE bytes. Reading a page that was never written fills
    /// buf with zeros. Blocking.
    fn read_page(&mut self, page_id: PageId, buf: &mut [u8]) -> Result<()>;

    /// Persist PAGE_SIZE bytes from buf as the page with the given id,
    /// overwrite the existing content if any. Blocking.
    fn write_page(&mut self, page_id: PageId, buf: &[u8]) -> Result<()>;

    /// Release the storage held by the page with the given id. Called by
    /// the buffer pool when a page is deleted. Reading the page afterwards
    /// yields zeros.
    fn deallocate_page(&mut self, page_id: PageId) -> Result<()>;
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum StorageType {
    Memory,
}

pub fn new_disk_manager(typ: StorageType) -> Result<Box<dyn DiskManager>> {
    match typ {
        StorageType::Memory => Ok(Box::new(memory::Memory::new())),
    }
}
