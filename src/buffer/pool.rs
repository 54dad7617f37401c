use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use log::debug;

use super::{Replacer, SyncLRUKReplacer};
use crate::container::hash::ExtendibleHashTable;
use crate::error::{Error, Result};
use crate::storage::page::{FrameId, Page, PageId, INVALID_PAGE_ID};
use crate::storage::DiskManager;
use crate::wal::LogManager;

/// The buffer pool is responsible for moving physical pages back and forth
/// from main memory to disk. It allows a DBMS to support databases that are
/// larger than the amount of memory available to the system.
///
/// The buffer pool's operations are transparent to other parts in the system.
/// For example, the system asks the buffer pool for a page using its unique
/// identifier (page_id) and it does not know whether that page is already in
/// memory or whether the system has to retrieve it from disk.
struct BufferPool {
    pool_size: usize,
    /// page-granular storage collaborator.
    disk: Box<dyn DiskManager>,
    /// write-ahead log collaborator, held on behalf of upper layers.
    log_manager: Option<Arc<LogManager>>,
    /// array of buffer pool pages. use the array index as
    /// FrameId, i.e., the FrameId is in range: [0, pool_size).
    pages: Vec<Arc<Page>>,
    /// page table for keeping track of buffer pool pages.
    page_table: ExtendibleHashTable<PageId, FrameId>,
    /// list of free frames that don't have any pages on them.
    free_list: VecDeque<FrameId>,
    /// Replacer to find unpinned pages for replacement.
    replacer: Arc<dyn Replacer>,
    /// The next page id to be allocated.
    next_page_id: PageId,
}

impl BufferPool {
    fn new(
        disk: Box<dyn DiskManager>,
        log_manager: Option<Arc<LogManager>>,
        pool_size: usize,
        replacer_k: usize,
        bucket_size: usize,
    ) -> Self {
        let mut pages = Vec::with_capacity(pool_size);
        let mut free_list = VecDeque::with_capacity(pool_size);
        let page_table = ExtendibleHashTable::new(bucket_size);
        let replacer: Arc<dyn Replacer> = Arc::new(SyncLRUKReplacer::new(replacer_k, pool_size));
        for i in 0..pool_size {
            pages.push(Arc::new(Page::new()));
            // initially, every page is in the free list
            free_list.push_back(i);
        }
        BufferPool {
            pool_size,
            disk,
            log_manager,
            pages,
            page_table,
            free_list,
            replacer,
            next_page_id: 0,
        }
    }

    /// Pick a usable frame, from the free list first, falling back to
    /// evicting the replacer's victim. An evicted frame has its page
    /// written back to disk when dirty, unlinked from the page table and
    /// reset before it is handed out. Return None if every frame is in
    /// use and pinned.
    fn acquire_frame(&mut self) -> Result<Option<FrameId>> {
        if let Some(frame_id) = self.free_list.pop_front() {
            return Ok(Some(frame_id));
        }
        let frame_id = match self.replacer.evict() {
            Some(frame_id) => frame_id,
            None => return Ok(None),
        };
        let page = Arc::clone(&self.pages[frame_id]);
        let mut guard = page.write()?;
        if guard.is_dirty {
            debug!("writing back dirty page {} from evicted frame {}", guard.id, frame_id);
            self.disk.write_page(guard.id, &guard.data)?;
        }
        self.page_table.remove(&guard.id);
        guard.clear();
        Ok(Some(frame_id))
    }

    /// Create a new page in the buffer pool, return the newly created page
    /// or Error::PoolNoAvailableFrame if all frames are currently in use
    /// and not evictable (in another word, pinned).
    ///
    /// Pick the replacement frame from either the free list or the replacer
    /// (always find from the free list first), and then call allocate_page
    /// to get a new page id. Reset the memory and metadata for the new page.
    ///
    /// Remember to "pin" the frame by calling replacer.set_evictable(frame_id, false)
    /// so that the replacer wouldn't evict the frame before the buffer pool
    /// manager "unpin" it.
    fn new_page(&mut self) -> Result<Arc<Page>> {
        let frame_id = match self.acquire_frame()? {
            Some(frame_id) => frame_id,
            None => return Err(Error::PoolNoAvailableFrame),
        };
        let new_page_id = self.allocate_page();

        let page = Arc::clone(&self.pages[frame_id]);
        let mut guard = page.write()?;
        guard.clear();
        guard.id = new_page_id;
        // pin the new page with initial value 1
        guard.pin_count = 1;
        // link the new page with frame into page table
        self.page_table.insert(new_page_id, frame_id);
        // record frame access and pin the frame in the replacer
        self.replacer.record_access(frame_id);
        self.replacer.set_evictable(frame_id, false);

        drop(guard);
        Ok(page)
    }

    /// Fetch the requested page with the given page id from the buffer pool.
    /// Return Error::PoolNoAvailableFrame if the page needs to be fetched
    /// from disk but all frames are currently in use and not evictable
    /// (in other words, pinned).
    ///
    /// First search for the page_id in the buffer pool. If not found, pick
    /// a replacement from either the free list or the replacer (always find
    /// from the free list first), and read the page from disk into the frame.
    fn fetch_page(&mut self, page_id: PageId) -> Result<Arc<Page>> {
        if let Some(frame_id) = self.page_table.find(&page_id) {
            // we have the page frame in buffer pool already,
            // increase pin count, record frame access then
            // return it.
            let page = Arc::clone(&self.pages[frame_id]);
            let mut guard = page.write()?;
            guard.pin_count += 1;
            self.replacer.record_access(frame_id);
            self.replacer.set_evictable(frame_id, false);

            drop(guard);
            return Ok(page);
        }

        let frame_id = match self.acquire_frame()? {
            Some(frame_id) => frame_id,
            None => return Err(Error::PoolNoAvailableFrame),
        };
        let page = Arc::clone(&self.pages[frame_id]);
        let mut guard = page.write()?;
        guard.clear();
        guard.id = page_id;
        guard.pin_count = 1;
        // set the disk data onto the page frame.
        self.disk.read_page(page_id, &mut guard.data)?;
        // link the new page with frame into page table
        self.page_table.insert(page_id, frame_id);
        // record frame access and pin the frame in the replacer
        self.replacer.record_access(frame_id);
        self.replacer.set_evictable(frame_id, false);

        drop(guard);
        Ok(page)
    }

    /// Unpin the target page from the buffer pool. If page_id is not in the
    /// buffer pool or its pin count is already 0, return false.
    ///
    /// Decrement the pin count of a page. If the pin count reaches 0, the
    /// frame becomes evictable by the replacer. The dirty flag is sticky:
    /// once any caller reports the page dirty it stays dirty until flushed,
    /// a clean hint never clears it.
    fn unpin_page(&mut self, page_id: PageId, is_dirty: bool) -> Result<bool> {
        let frame_id = match self.page_table.find(&page_id) {
            Some(frame_id) => frame_id,
            None => return Ok(false),
        };
        let page = &self.pages[frame_id];
        let mut guard = page.write()?;
        if guard.pin_count == 0 {
            return Ok(false);
        }
        guard.is_dirty = guard.is_dirty || is_dirty;
        guard.pin_count -= 1;
        if guard.pin_count == 0 {
            self.replacer.set_evictable(frame_id, true);
        }
        Ok(true)
    }

    /// Flush the target page to disk regardless of the dirty flag and unset
    /// the dirty flag of the page after flushing. Pins and evictability are
    /// left untouched.
    ///
    /// Return false if the page cannot be found in the page table, true
    /// otherwise.
    fn flush_page(&mut self, page_id: PageId) -> Result<bool> {
        let frame_id = match self.page_table.find(&page_id) {
            Some(frame_id) => frame_id,
            None => return Ok(false),
        };
        let page = &self.pages[frame_id];
        let mut guard = page.write()?;
        self.disk.write_page(guard.id, &guard.data)?;
        guard.is_dirty = false;
        Ok(true)
    }

    /// Flush every resident dirty page in the buffer pool to disk.
    fn flush_all_pages(&mut self) -> Result<()> {
        for page in &self.pages {
            let mut guard = page.write()?;
            if guard.id == INVALID_PAGE_ID || !guard.is_dirty {
                continue;
            }
            debug!("flushing dirty page {}", guard.id);
            self.disk.write_page(guard.id, &guard.data)?;
            guard.is_dirty = false;
        }
        Ok(())
    }

    /// Delete a page from the buffer pool. If the page is not in the buffer
    /// pool, there is nothing to do and the deletion trivially succeeds. If
    /// the page is pinned, return false immediately.
    ///
    /// After unlinking the page from the page table, stop tracking the frame
    /// in the replacer, reset the frame and add it back to the free list,
    /// then hand the page id back to the storage for deallocation.
    fn delete_page(&mut self, page_id: PageId) -> Result<bool> {
        let frame_id = match self.page_table.find(&page_id) {
            Some(frame_id) => frame_id,
            None => return Ok(true),
        };
        let page = Arc::clone(&self.pages[frame_id]);
        let mut guard = page.write()?;
        if guard.pin_count > 0 {
            return Ok(false);
        }
        // unlink the page from page table
        self.page_table.remove(&page_id);
        // stop tracking the frame in the replacer
        self.replacer.remove(frame_id);
        // clean page frame and add it back to the free list
        guard.clear();
        self.free_list.push_back(frame_id);
        // free the page on the storage side as well
        self.disk.deallocate_page(page_id)?;
        Ok(true)
    }

    fn allocate_page(&mut self) -> PageId {
        let page_id = self.next_page_id;
        self.next_page_id += 1;
        page_id
    }
}

/// Buffer pool manager wraps the buffer pool with a mutex for concurrent
/// access, basically all the heavy lifting happens in the buffer pool. The
/// mutex is the pool latch: it is held for the full duration of every public
/// operation, disk I/O included, which keeps the page table, the replacer
/// and the frame metadata consistent with each other.
pub struct BufferPoolManager {
    inner: Arc<Mutex<BufferPool>>,
}

impl BufferPoolManager {
    pub fn new(
        disk: Box<dyn DiskManager>,
        log_manager: Option<Arc<LogManager>>,
        pool_size: usize,
        replacer_k: usize,
        bucket_size: usize,
    ) -> Self {
        let inner = BufferPool::new(disk, log_manager, pool_size, replacer_k, bucket_size);
        BufferPoolManager { inner: Arc::new(Mutex::new(inner)) }
    }

    /// Create a new page in the buffer pool.
    pub fn new_page(&self) -> Result<Arc<Page>> {
        let mut inner = self.inner.lock()?;
        inner.new_page()
    }

    /// Fetch the requested page with the given page id from the buffer pool.
    pub fn fetch_page(&self, page_id: PageId) -> Result<Arc<Page>> {
        let mut inner = self.inner.lock()?;
        inner.fetch_page(page_id)
    }

    /// Unpin the target page from the buffer pool. If page_id is not in the
    /// buffer pool or its pin count is already 0, return false.
    pub fn unpin_page(&self, page_id: PageId, is_dirty: bool) -> Result<bool> {
        let mut inner = self.inner.lock()?;
        inner.unpin_page(page_id, is_dirty)
    }

    /// Flush the target page to disk regardless of the dirty flag and unset
    /// the dirty flag of the page after flushing.
    pub fn flush_page(&self, page_id: PageId) -> Result<bool> {
        let mut inner = self.inner.lock()?;
        inner.flush_page(page_id)
    }

    /// Flush every resident dirty page in the buffer pool to disk.
    pub fn flush_all_pages(&self) -> Result<()> {
        let mut inner = self.inner.lock()?;
        inner.flush_all_pages()
    }

    /// Delete a page from the buffer pool. If the page is not in the buffer
    /// pool, do nothing and return true. If the page is pinned and cannot
    /// be deleted, return false immediately.
    pub fn delete_page(&self, page_id: PageId) -> Result<bool> {
        let mut inner = self.inner.lock()?;
        inner.delete_page(page_id)
    }

    /// The write-ahead log collaborator this pool was built with, if any.
    pub fn log_manager(&self) -> Result<Option<Arc<LogManager>>> {
        let inner = self.inner.lock()?;
        Ok(inner.log_manager.clone())
    }

    /// Number of frames in the pool.
    pub fn pool_size(&self) -> Result<usize> {
        let inner = self.inner.lock()?;
        Ok(inner.pool_size)
    }
}
