use std::sync::Arc;
use std::thread;

use framedb::buffer::BufferPoolManager;
use framedb::error::Result;
use framedb::storage::disk::FileDisk;
use framedb::storage::page::PageId;
use framedb::wal::LogManager;

const POOL_SIZE: usize = 16;
const PAGES_PER_THREAD: usize = 20;
const NUM_THREADS: usize = 4;

fn new_manager(dir: &tempfile::TempDir) -> Result<BufferPoolManager> {
    let _ = env_logger::builder().try_init();
    let disk = Box::new(FileDisk::open(dir.path().join("test.db"))?);
    let log_manager = Some(Arc::new(LogManager::new()));
    Ok(BufferPoolManager::new(disk, log_manager, POOL_SIZE, 2, 8))
}

/// Every thread keeps creating pages, stamping each page with its own id
/// and unpinning it as dirty. The pool is far smaller than the total number
/// of pages, so frames are recycled constantly and dirty pages must be
/// written back to the data file to survive.
#[test]
fn test_concurrent_new_and_fetch() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let bpm = Arc::new(new_manager(&dir)?);
    assert!(bpm.log_manager()?.is_some());

    let mut handles = Vec::new();
    for _ in 0..NUM_THREADS {
        let bpm = Arc::clone(&bpm);
        handles.push(thread::spawn(move || -> Result<Vec<PageId>> {
            let mut page_ids = Vec::new();
            for _ in 0..PAGES_PER_THREAD {
                let page = bpm.new_page()?;
                let page_id = {
                    let mut guard = page.write()?;
                    let id = guard.id;
                    guard.data[..4].copy_from_slice(&id.to_le_bytes());
                    id
                };
                assert!(bpm.unpin_page(page_id, true)?);
                page_ids.push(page_id);
            }
            Ok(page_ids)
        }));
    }

    let mut all_ids = Vec::new();
    for handle in handles {
        let ids = handle.join().expect("worker thread panicked")?;
        all_ids.extend(ids);
    }

    // page ids are minted from one monotonic counter, no duplicates
    let total = NUM_THREADS * PAGES_PER_THREAD;
    assert_eq!(total, all_ids.len());
    all_ids.sort();
    all_ids.dedup();
    assert_eq!(total, all_ids.len());

    // every page survived the frame recycling with its stamp intact
    bpm.flush_all_pages()?;
    for &page_id in &all_ids {
        let page = bpm.fetch_page(page_id)?;
        let guard = page.read()?;
        assert_eq!(page_id.to_le_bytes(), guard.data[..4]);
        drop(guard);
        assert!(bpm.unpin_page(page_id, false)?);
    }

    Ok(())
}

/// Pins held by one thread must survive eviction pressure from others.
#[test]
fn test_pinned_pages_survive_pressure() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let bpm = Arc::new(new_manager(&dir)?);

    // pin one page and stamp it
    let pinned = bpm.new_page()?;
    let pinned_id = {
        let mut guard = pinned.write()?;
        guard.data[..6].copy_from_slice(b"pinned");
        guard.id
    };

    // churn through pages on other threads to force evictions
    let mut handles = Vec::new();
    for _ in 0..NUM_THREADS {
        let bpm = Arc::clone(&bpm);
        handles.push(thread::spawn(move || -> Result<()> {
            for _ in 0..PAGES_PER_THREAD {
                let page = bpm.new_page()?;
                let page_id = page.read()?.id;
                assert!(bpm.unpin_page(page_id, true)?);
            }
            Ok(())
        }));
    }
    for handle in handles {
        handle.join().expect("worker thread panicked")?;
    }

    // the pinned page never left its frame
    let guard = pinned.read()?;
    assert_eq!(pinned_id, guard.id);
    assert_eq!(b"pinned", &guard.data[..6]);
    drop(guard);
    assert!(bpm.unpin_page(pinned_id, false)?);

    Ok(())
}
