use crate::storage::page::FrameId;

/// Replacer tracks frame usage for replacement in case the buffer pool
/// is full.
pub trait Replacer: Send + Sync {
    /// Record the event that the given frame id is accessed at current
    /// timestamp. Panics if the frame id is out of the pool range, that
    /// is a caller bug.
    fn record_access(&self, frame_id: FrameId);

    /// Find the frame to evict with the replacement policy (backward
    /// k-distance). Only frames that are marked as evictable are
    /// candidates for eviction.
    ///
    /// Successful eviction of a frame should decrement the size of the
    /// replacer and reset the frame's access history.
    ///
    /// Return the frame id if a frame is evicted successfully, None if
    /// no frame can be evicted.
    fn evict(&self) -> Option<FrameId>;

    /// Toggle whether a frame is evictable or non-evictable. this function
    /// also controls the replacer size. Note that size is equal to the
    /// number of evictable entries.
    ///
    /// If a frame was previously evictable and is to be set to
    /// non-evictable, then size should decrement. If a frame was
    /// previously non-evictable and is to be set evictable, then size
    /// should increment.
    fn set_evictable(&self, frame_id: FrameId, evictable: bool);

    /// Remove an evictable frame from the replacer, along with its access
    /// history, decrementing the replacer size. Unlike evict this ignores
    /// the replacement policy and removes the specified frame.
    ///
    /// Removing a non-evictable frame is a caller bug and panics. If the
    /// specified frame has no recorded history, do nothing.
    fn remove(&self, frame_id: FrameId);

    /// Number of evictable frames.
    fn size(&self) -> usize;
}

pub mod pool;
mod replacer;

pub use pool::BufferPoolManager;
pub use replacer::SyncLRUKReplacer;
