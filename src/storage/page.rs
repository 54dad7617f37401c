use std::ops::Deref;
use std::sync::RwLock;

/// Logical page identifier. Pages are logically infinite, the buffer
/// pool mints new ids from a monotonic counter starting at 0.
pub type PageId = i32;

/// Index into the buffer pool frame array, in range [0, pool_size).
pub type FrameId = usize;

/// Size of a data page in bytes.
pub const PAGE_SIZE: usize = 4096;

/// Sentinel page id denoting "no page resides in this frame".
pub const INVALID_PAGE_ID: PageId = -1;

/// The actual page data that include in-memory metadata
/// like dirty bit and pin count etc. and the data on storage.
pub struct PageData {
    pub id: PageId,
    pub data: Vec<u8>,
    pub is_dirty: bool,
    pub pin_count: i32,
}

impl PageData {
    fn new() -> Self {
        Self {
            id: INVALID_PAGE_ID,
            data: vec![0; PAGE_SIZE],
            is_dirty: false,
            pin_count: 0,
        }
    }

    /// Reset the frame to its logically empty state: invalid page id,
    /// zeroed buffer, no pins, not dirty.
    pub fn clear(&mut self) {
        self.id = INVALID_PAGE_ID;
        self.is_dirty = false;
        self.pin_count = 0;
        self.data.fill(0);
    }
}

/// Page act as the container of the actual page data for
/// providing concurrent access protection. External holders
/// mutate the buffer through the lock and signal dirtiness
/// through the buffer pool's unpin_page, never by writing
/// the metadata fields directly.
pub struct Page {
    inner: RwLock<PageData>,
}

impl Page {
    /// Allocate a page in memory with the given PAGE_SIZE and init
    /// the metadata accordingly.
    pub fn new() -> Self {
        Page { inner: RwLock::new(PageData::new()) }
    }
}

impl Default for Page {
    fn default() -> Self {
        Page::new()
    }
}

impl Deref for Page {
    type Target = RwLock<PageData>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
