use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Mutex;

use hashlink::LinkedHashMap;

use super::FrameId;
use super::Replacer;

/// Access bookkeeping for one tracked frame: the k most recent access
/// timestamps with the oldest at the front, truncated once the window fills.
struct LRUKNode {
    k: usize,
    is_evictable: bool,
    history: VecDeque<usize>,
}

impl LRUKNode {
    fn new(k: usize) -> Self {
        LRUKNode { k, is_evictable: false, history: VecDeque::with_capacity(k) }
    }

    fn record_access(&mut self, timestamp: usize) {
        if self.history.len() == self.k {
            self.history.pop_front();
        }
        self.history.push_back(timestamp)
    }

    fn has_full_window(&self) -> bool {
        self.history.len() == self.k
    }

    /// Timestamp of the k-th most recent access. Only called on nodes with a
    /// full window, where the front of the deque is exactly that access.
    fn kth_recent(&self) -> usize {
        *self.history.front().expect("access history is never empty")
    }
}

/// LRUKReplacer implements the LRU-k replacement policy.
///
/// LRU-k evicts the frame whose backward k-distance is largest, where the
/// backward k-distance is the time elapsed since the k-th most recent access.
/// A frame with fewer than k recorded accesses has +inf backward k-distance
/// and is therefore always preferred over fully sampled frames; among those
/// cold frames the one with the earliest recorded access goes first.
///
/// Tracked frames live in one of two regions. The `history` region holds
/// frames below k samples in order of first access, so its eviction candidate
/// sits at the front. The `cache` region holds fully sampled frames with the
/// most recent access at the back; its victim is the frame whose k-th most
/// recent access is earliest. Each region is a linked hash map, which gives
/// constant-time relocation when an access moves a frame within or between
/// regions.
pub struct LRUKReplacer {
    nodes: HashMap<FrameId, LRUKNode>,
    /// frames with fewer than k recorded accesses, earliest first access at
    /// the front.
    history: LinkedHashMap<FrameId, ()>,
    /// frames with a full window of k accesses, most recent access at the back.
    cache: LinkedHashMap<FrameId, ()>,
    current_timestamp: usize,
    curr_size: usize,
    replacer_size: usize,
    k: usize,
}

impl LRUKReplacer {
    pub fn new(k: usize, num_frames: usize) -> Self {
        assert!(k > 0, "replacer k should be larger than zero");
        LRUKReplacer {
            nodes: HashMap::with_capacity(num_frames),
            history: LinkedHashMap::new(),
            cache: LinkedHashMap::new(),
            current_timestamp: 0,
            curr_size: 0,
            replacer_size: num_frames,
            k,
        }
    }

    /// Note an access to the given frame, creating its node on first sight.
    /// The node is then relocated: a frame crossing the k threshold moves
    /// from the history region to the recent end of the cache region, a cache
    /// frame moves to the recent end, and a frame still below k samples keeps
    /// its first-access position.
    fn record_access(&mut self, frame_id: FrameId) {
        if frame_id >= self.replacer_size {
            panic!(
                "frame id {} out of range for a replacer tracking {} frames",
                frame_id, self.replacer_size
            );
        }
        let timestamp = self.current_timestamp;
        self.current_timestamp += 1;

        let k = self.k;
        let node = self.nodes.entry(frame_id).or_insert_with(|| LRUKNode::new(k));
        let was_full = node.has_full_window();
        let is_new = node.history.is_empty();
        node.record_access(timestamp);
        let now_full = node.has_full_window();

        if now_full {
            if was_full {
                self.cache.remove(&frame_id);
            } else {
                self.history.remove(&frame_id);
            }
            self.cache.insert(frame_id, ());
        } else if is_new {
            self.history.insert(frame_id, ());
        }
    }

    /// Pick and drop the eviction victim: the front of the history region if
    /// any of it is evictable, otherwise the evictable cache frame whose k-th
    /// most recent access is earliest.
    fn evict(&mut self) -> Option<FrameId> {
        if self.curr_size == 0 {
            return None;
        }
        let mut victim =
            self.history.keys().copied().find(|frame_id| self.nodes[frame_id].is_evictable);
        if victim.is_none() {
            victim = self
                .cache
                .keys()
                .copied()
                .filter(|frame_id| self.nodes[frame_id].is_evictable)
                .min_by_key(|frame_id| self.nodes[frame_id].kth_recent());
        }
        let frame_id = victim?;
        self.remove_node(frame_id);
        Some(frame_id)
    }

    fn set_evictable(&mut self, frame_id: FrameId, evictable: bool) {
        let node = match self.nodes.get_mut(&frame_id) {
            Some(node) => node,
            None => panic!("set_evictable on untracked frame {}", frame_id),
        };
        if node.is_evictable == evictable {
            return;
        }
        node.is_evictable = evictable;
        if evictable {
            self.curr_size += 1;
        } else {
            self.curr_size -= 1;
        }
    }

    fn is_evictable(&self, frame_id: FrameId) -> bool {
        self.nodes.get(&frame_id).map_or(true, |node| node.is_evictable)
    }

    fn remove(&mut self, frame_id: FrameId) {
        match self.nodes.get(&frame_id) {
            Some(node) if !node.is_evictable => {
                panic!("remove on non-evictable frame {}", frame_id)
            }
            Some(_) => self.remove_node(frame_id),
            None => {}
        }
    }

    fn size(&self) -> usize {
        self.curr_size
    }

    fn remove_node(&mut self, frame_id: FrameId) {
        // callers have checked that the node exists
        let node = self.nodes.remove(&frame_id).expect("removing untracked node");
        if node.has_full_window() {
            self.cache.remove(&frame_id);
        } else {
            self.history.remove(&frame_id);
        }
        if node.is_evictable {
            self.curr_size -= 1;
        }
    }
}

/// SyncLRUKReplacer is the thread-safe version of the LRU-k replacement
/// policy; every operation locks the inner replacer for its duration, so each
/// is individually atomic.
pub struct SyncLRUKReplacer {
    inner: Mutex<LRUKReplacer>,
}

impl SyncLRUKReplacer {
    pub fn new(k: usize, num_frames: usize) -> Self {
        let inner = Mutex::new(LRUKReplacer::new(k, num_frames));
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

    fn is_evictable(&self, frame_id: FrameId) -> bool {
        let guard = self.inner.lock().unwrap();
        guard.is_evictable(frame_id)
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
