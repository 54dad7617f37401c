use std::collections::VecDeque;
use std::sync::Mutex;

use super::Replacer;
use crate::storage::page::FrameId;

fn remove_from(list: &mut VecDeque<FrameId>, frame_id: FrameId) {
    if let Some(pos) = list.iter().position(|&f| f == frame_id) {
        list.remove(pos);
    }
}

/// LRUKReplacer implements the LRU-k replacement policy.
///
/// The LRU-k algorithm evicts the frame whose backward k-distance is the
/// maximum of all frames. Backward k-distance is computed as the difference
/// in time between the current timestamp and the timestamp of the k-th
/// previous access.
///
/// A frame with less than k recorded accesses has +inf backward k-distance
/// and lives in the history list; once its access count reaches k it
/// migrates to the cache list. Both lists keep the most recent entry at the
/// front, so the tail of each list is its eviction candidate, and history
/// frames are always victimized before cache frames.
pub struct LRUKReplacer {
    k: usize,
    /// upper bound on frame ids, equal to the pool size.
    replacer_size: usize,
    /// number of evictable frames.
    curr_size: usize,
    access_count: Vec<usize>,
    evictable: Vec<bool>,
    /// frames with fewer than k accesses, most recent first.
    history_list: VecDeque<FrameId>,
    /// frames with at least k accesses, most recent first.
    cache_list: VecDeque<FrameId>,
}

impl LRUKReplacer {
    pub fn new(k: usize, size: usize) -> Self {
        assert!(k > 0, "replacer k should be larger than zero");
        LRUKReplacer {
            k,
            replacer_size: size,
            curr_size: 0,
            access_count: vec![0; size],
            evictable: vec![false; size],
            history_list: VecDeque::new(),
            cache_list: VecDeque::new(),
        }
    }

    fn check_frame(&self, frame_id: FrameId) {
        assert!(
            frame_id < self.replacer_size,
            "frame id {} out of range, pool size is {}",
            frame_id,
            self.replacer_size
        );
    }

    /// Record the event that the given frame id is accessed at current
    /// timestamp.
    fn record_access(&mut self, frame_id: FrameId) {
        self.check_frame(frame_id);
        self.access_count[frame_id] += 1;
        let count = self.access_count[frame_id];
        if count == self.k {
            // the frame graduates from the history list to the cache list.
            remove_from(&mut self.history_list, frame_id);
            self.cache_list.push_front(frame_id);
        } else if count > self.k {
            remove_from(&mut self.cache_list, frame_id);
            self.cache_list.push_front(frame_id);
        } else {
            remove_from(&mut self.history_list, frame_id);
            self.history_list.push_front(frame_id);
        }
    }

    /// Evict the frame with the largest backward k-distance: scan the
    /// history list from its tail first since those frames have +inf
    /// k-distance, fall back to the tail of the cache list.
    fn evict(&mut self) -> Option<FrameId> {
        if self.curr_size == 0 {
            return None;
        }
        if let Some(pos) = self.history_list.iter().rposition(|&f| self.evictable[f]) {
            let frame_id = self.history_list.remove(pos).unwrap();
            self.evicted(frame_id);
            return Some(frame_id);
        }
        if let Some(pos) = self.cache_list.iter().rposition(|&f| self.evictable[f]) {
            let frame_id = self.cache_list.remove(pos).unwrap();
            self.evicted(frame_id);
            return Some(frame_id);
        }
        None
    }

    fn evicted(&mut self, frame_id: FrameId) {
        self.access_count[frame_id] = 0;
        self.evictable[frame_id] = false;
        self.curr_size -= 1;
    }

    /// Toggle whether a frame is evictable or non-evictable, adjusting the
    /// evictable count on actual transitions. Toggling a frame with no
    /// recorded history does nothing.
    fn set_evictable(&mut self, frame_id: FrameId, evictable: bool) {
        self.check_frame(frame_id);
        if self.access_count[frame_id] == 0 {
            return;
        }
        if self.evictable[frame_id] == evictable {
            return;
        }
        self.evictable[frame_id] = evictable;
        if evictable {
            self.curr_size += 1;
        } else {
            self.curr_size -= 1;
        }
    }

    /// Remove an evictable frame from whichever list holds it, along with
    /// its access history. Panics if the frame is currently non-evictable,
    /// does nothing if the frame has no recorded history.
    fn remove(&mut self, frame_id: FrameId) {
        self.check_frame(frame_id);
        if self.access_count[frame_id] == 0 {
            return;
        }
        assert!(
            self.evictable[frame_id],
            "cannot remove non-evictable frame {}",
            frame_id
        );
        if self.access_count[frame_id] >= self.k {
            remove_from(&mut self.cache_list, frame_id);
        } else {
            remove_from(&mut self.history_list, frame_id);
        }
        self.access_count[frame_id] = 0;
        self.evictable[frame_id] = false;
        self.curr_size -= 1;
    }

    fn size(&self) -> usize {
        self.curr_size
    }
}

/// SyncLRUKReplacer implements the thread-safe version of the LRU-k
/// replacement policy, basically all the heavy lifting happens in the
/// LRUKReplacer.
pub struct SyncLRUKReplacer {
    inner: Mutex<LRUKReplacer>,
}

impl SyncLRUKReplacer {
    pub fn new(k: usize, size: usize) -> Self {
        let inner = Mutex::new(LRUKReplacer::new(k, size));
        SyncLRUKReplacer { inner }
    }
}

impl Replacer for SyncLRUKReplacer {
    fn record_access(&self, frame_id: FrameId) {
        let mut guard = self.inner.lock().unwrap();
        guard.record_access(frame_id)
    }

    fn evict(&self) -> Option<FrameId> {
        let mut guard = self.inner.lock().unwrap();
        guard.evict()
    }

    fn set_evictable(&self, frame_id: FrameId, evictable: bool) {
        let mut guard = self.inner.lock().unwrap();
        guard.set_evictable(frame_id, evictable)
    }

    fn remove(&self, frame_id: FrameId) {
        let mut guard = self.inner.lock().unwrap();
        guard.remove(frame_id)
    }

    fn size(&self) -> usize {
        let guard = self.inner.lock().unwrap();
        guard.size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lruk_replacer() {
        let mut lru_replacer = LRUKReplacer::new(2, 7);

        // Scenario: add six frames to the replacer. We have [1,2,3,4,5].
        // Frame 6 is non-evictable.
        lru_replacer.record_access(1);
        lru_replacer.record_access(2);
        lru_replacer.record_access(3);
        lru_replacer.record_access(4);
        lru_replacer.record_access(5);
        lru_replacer.record_access(6);
        lru_replacer.set_evictable(1, true);
        lru_replacer.set_evictable(2, true);
        lru_replacer.set_evictable(3, true);
        lru_replacer.set_evictable(4, true);
        lru_replacer.set_evictable(5, true);
        lru_replacer.set_evictable(6, false);
        assert_eq!(5, lru_replacer.size());

        // Scenario: insert access history for frame 1. Now frame 1 has two
        // accesses and moves to the cache list. All other frames have +inf
        // backward k-distance. The order of eviction is [2,3,4,5,1].
        lru_replacer.record_access(1);

        // Scenario: evict three frames from the replacer. Frames with +inf
        // k-distance are popped first, oldest first.
        assert_eq!(Some(2), lru_replacer.evict());
        assert_eq!(Some(3), lru_replacer.evict());
        assert_eq!(Some(4), lru_replacer.evict());
        assert_eq!(2, lru_replacer.size());

        // Scenario: now the replacer has frames [5,1]. Insert new frames 3
        // and 4, and update the access history for 5. The eviction order
        // becomes [3,1,5,4].
        lru_replacer.record_access(3);
        lru_replacer.record_access(4);
        lru_replacer.record_access(5);
        lru_replacer.record_access(4);
        lru_replacer.set_evictable(3, true);
        lru_replacer.set_evictable(4, true);
        assert_eq!(4, lru_replacer.size());

        // Scenario: keep looking for victims, 3 is the only history frame.
        assert_eq!(Some(3), lru_replacer.evict());
        assert_eq!(3, lru_replacer.size());

        // Set 6 to be evictable. 6 should be evicted next since it still
        // has +inf backward k-distance.
        lru_replacer.set_evictable(6, true);
        assert_eq!(4, lru_replacer.size());
        assert_eq!(Some(6), lru_replacer.evict());
        assert_eq!(3, lru_replacer.size());

        // Now we have [1,5,4]. Continue looking for victims.
        lru_replacer.set_evictable(1, false);
        assert_eq!(2, lru_replacer.size());
        assert_eq!(Some(5), lru_replacer.evict());
        assert_eq!(1, lru_replacer.size());

        // Update access history for 1, then make it evictable again. Now we
        // have [4,1], the next victim is 4.
        lru_replacer.record_access(1);
        lru_replacer.record_access(1);
        lru_replacer.set_evictable(1, true);
        assert_eq!(2, lru_replacer.size());
        assert_eq!(Some(4), lru_replacer.evict());

        assert_eq!(1, lru_replacer.size());
        assert_eq!(Some(1), lru_replacer.evict());
        assert_eq!(0, lru_replacer.size());

        // These operations should not modify size.
        assert_eq!(None, lru_replacer.evict());
        assert_eq!(0, lru_replacer.size());
        lru_replacer.remove(1);
        assert_eq!(0, lru_replacer.size());
    }

    #[test]
    fn test_history_frames_evicted_before_cache_frames() {
        let mut replacer = LRUKReplacer::new(2, 4);

        // frame 2 reaches k accesses, frame 1 is accessed afterwards but
        // only once. the history frame still goes first.
        replacer.record_access(2);
        replacer.record_access(2);
        replacer.record_access(1);
        replacer.set_evictable(1, true);
        replacer.set_evictable(2, true);

        assert_eq!(Some(1), replacer.evict());
        assert_eq!(Some(2), replacer.evict());
        assert_eq!(None, replacer.evict());
    }

    #[test]
    fn test_eviction_order_mixed() {
        let mut replacer = LRUKReplacer::new(2, 4);

        // access pattern [1,2,3,1,2,1]: frame 1 has 3 accesses, frame 2
        // has 2, frame 3 only 1 and is the single history frame.
        for frame_id in [1, 2, 3, 1, 2, 1] {
            replacer.record_access(frame_id);
        }
        for frame_id in 1..4 {
            replacer.set_evictable(frame_id, true);
        }
        assert_eq!(3, replacer.size());

        assert_eq!(Some(3), replacer.evict());
        // among the cache frames the k-th most recent access of frame 2 is
        // older than that of frame 1.
        assert_eq!(Some(2), replacer.evict());
        assert_eq!(Some(1), replacer.evict());
    }

    #[test]
    fn test_k_one_degenerates_to_lru() {
        let mut replacer = LRUKReplacer::new(1, 4);

        replacer.record_access(0);
        replacer.record_access(1);
        replacer.record_access(2);
        replacer.record_access(0);
        for frame_id in 0..3 {
            replacer.set_evictable(frame_id, true);
        }

        assert_eq!(Some(1), replacer.evict());
        assert_eq!(Some(2), replacer.evict());
        assert_eq!(Some(0), replacer.evict());
    }

    #[test]
    fn test_remove_untracked_frame_is_noop() {
        let mut replacer = LRUKReplacer::new(2, 4);
        replacer.remove(3);
        assert_eq!(0, replacer.size());
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_record_access_out_of_range() {
        let mut replacer = LRUKReplacer::new(2, 4);
        replacer.record_access(4);
    }

    #[test]
    #[should_panic(expected = "non-evictable")]
    fn test_remove_non_evictable() {
        let mut replacer = LRUKReplacer::new(2, 4);
        replacer.record_access(1);
        replacer.remove(1);
    }

    #[test]
    fn test_sync_replacer() {
        let replacer = SyncLRUKReplacer::new(2, 4);
        replacer.record_access(0);
        replacer.record_access(1);
        replacer.set_evictable(0, true);
        replacer.set_evictable(1, true);
        assert_eq!(2, replacer.size());
        assert_eq!(Some(0), replacer.evict());
        assert_eq!(1, replacer.size());
    }
}
