use std::sync::atomic::{AtomicI64, Ordering};

/// Log sequence number.
pub type Lsn = i64;

pub const INVALID_LSN: Lsn = -1;

/// The write-ahead log collaborator. The buffer pool holds a reference on
/// behalf of the upper layers and requires no behavior from it, logging
/// page mutations is the caller's business. Only the monotonic lsn counter
/// lives here for now.
#[derive(Debug, Default)]
pub struct LogManager {
    next_lsn: AtomicI64,
}

impl LogManager {
    pub fn new() -> Self {
        LogManager { next_lsn: AtomicI64::new(0) }
    }

    /// Reserve the next log sequence number.
    pub fn next_lsn(&self) -> Lsn {
        self.next_lsn.fetch_add(1, Ordering::SeqCst)
    }
}
