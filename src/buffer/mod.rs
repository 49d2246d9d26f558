pub mod guard;
pub mod pool;
pub mod replacer;

/// A frame slot index in the buffer pool, in `[0, pool_size)`. Frames are
/// never reallocated; their index is their identity.
pub type FrameId = usize;

/// Replacer tracks per-frame access history and picks the frame to give up
/// when the buffer pool runs out of free frames.
pub trait Replacer: Send + Sync {
    /// Note an access to the given frame at the current timestamp, creating
    /// the access history for a frame that has not been seen before. Newly
    /// tracked frames start out non-evictable.
    ///
    /// Panics if the frame id lies outside the replacer's capacity.
    fn record_access(&self, frame_id: FrameId);

    /// Pick a victim among the evictable frames according to the replacement
    /// policy and drop its access history entirely.
    ///
    /// Returns the victim's frame id, or None when no frame is evictable.
    fn evict(&self) -> Option<FrameId>;

    /// Toggle whether a frame may be chosen by evict. The replacer size only
    /// counts evictable frames, so flipping the flag adjusts it; setting the
    /// flag to its current value changes nothing.
    ///
    /// Panics if the frame is not tracked.
    fn set_evictable(&self, frame_id: FrameId, evictable: bool);

    /// Whether a frame may currently be evicted. Untracked frames report true.
    fn is_evictable(&self, frame_id: FrameId) -> bool;

    /// Drop a specific frame's access history regardless of the replacement
    /// policy. Removing an untracked frame does nothing.
    ///
    /// Panics if the frame is tracked but non-evictable.
    fn remove(&self, frame_id: FrameId);

    /// Number of evictable frames.
    fn size(&self) -> usize;
}
