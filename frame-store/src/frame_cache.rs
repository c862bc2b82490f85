use crate::block_dev::BlockDevice;
use crate::region::PageRegion;
use crate::{Page, BLOCKS_PER_PAGE, BLOCK_SZ, NFRAMES};
use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;

#[derive(Clone, Copy)]
struct SlotTag {
    /// Frame currently resident in this slot, or `None` when empty.
    frame: Option<usize>,
    /// Set when the slot bytes differ from the backing store.
    dirty: bool,
}

const EMPTY: SlotTag = SlotTag {
    frame: None,
    dirty: false,
};

/// The paging device: a small set of fast-memory slots caching the 256-frame
/// disk-backed store.
///
/// Invariants kept by every operation:
/// - a frame id is resident in at most one slot,
/// - a clean slot is byte-identical to the disk blocks of its frame,
/// - [`invalidate`] never touches the disk.
///
/// Eviction picks a victim slot uniformly at random; a dirty victim writes
/// its eight blocks back first.
///
/// [`invalidate`]: FrameCache::invalidate
pub struct FrameCache {
    dev: Arc<dyn BlockDevice>,
    slots: PageRegion,
    tags: Vec<SlotTag>,
    rand: u32,
}

impl FrameCache {
    /// Creates a cache staging into `slots`, with all slots empty and clean.
    ///
    /// The slot count is the page count of the region: 256 on the emulator
    /// (every frame fits), 28 on the board.
    pub fn new(dev: Arc<dyn BlockDevice>, slots: PageRegion) -> Self {
        let nslots = slots.npages();
        assert!(nslots > 0 && nslots <= NFRAMES);
        Self {
            dev,
            slots,
            tags: vec![EMPTY; nslots],
            rand: 0x9e37_79b9,
        }
    }

    pub fn nslots(&self) -> usize {
        self.tags.len()
    }

    /// Slot currently holding `frame_id`, if resident.
    pub fn slot_of(&self, frame_id: usize) -> Option<usize> {
        self.tags
            .iter()
            .position(|t| t.frame == Some(frame_id))
    }

    /// Frame resident in `slot`, if any.
    pub fn frame_at(&self, slot: usize) -> Option<usize> {
        self.tags[slot].frame
    }

    /// Drops `frame_id` from the cache without writing it back.
    ///
    /// Losing uncommitted bytes is the caller's contract (used when a frame
    /// is freed). Idempotent: invalidating an absent frame is a no-op.
    pub fn invalidate(&mut self, frame_id: usize) {
        if let Some(idx) = self.slot_of(frame_id) {
            self.tags[idx] = EMPTY;
        }
    }

    /// Stages `src` as the new contents of `frame_id` and marks it dirty.
    ///
    /// When the frame is resident and already holds exactly these bytes the
    /// copy (and the dirty marking) is skipped.
    pub fn write(&mut self, frame_id: usize, src: &Page) {
        assert!(frame_id < NFRAMES);
        if let Some(idx) = self.slot_of(frame_id) {
            if self.slots.page(idx) == src {
                return;
            }
            self.slots.page_mut(idx).copy_from_slice(src);
            self.tags[idx].dirty = true;
            return;
        }
        let idx = self.take_slot();
        self.tags[idx] = SlotTag {
            frame: Some(frame_id),
            dirty: true,
        };
        self.slots.page_mut(idx).copy_from_slice(src);
    }

    /// Returns the fast-memory page holding `frame_id`, installing it first
    /// if it is not resident.
    ///
    /// A missing frame is filled from its eight disk blocks unless
    /// `alloc_only` is set, in which case the contents are left undefined
    /// (the caller is about to overwrite a freshly allocated frame).
    pub fn read(&mut self, frame_id: usize, alloc_only: bool) -> &mut Page {
        assert!(frame_id < NFRAMES);
        let idx = match self.slot_of(frame_id) {
            Some(idx) => idx,
            None => {
                let idx = self.take_slot();
                self.tags[idx] = SlotTag {
                    frame: Some(frame_id),
                    dirty: false,
                };
                if !alloc_only {
                    let dev = Arc::clone(&self.dev);
                    let page = self.slots.page_mut(idx);
                    for i in 0..BLOCKS_PER_PAGE {
                        dev.read_block(
                            frame_id * BLOCKS_PER_PAGE + i,
                            &mut page[i * BLOCK_SZ..(i + 1) * BLOCK_SZ],
                        );
                    }
                }
                idx
            }
        };
        self.slots.page_mut(idx)
    }

    /// Finds a free slot, evicting a random victim when none is left.
    fn take_slot(&mut self) -> usize {
        if let Some(idx) = self.tags.iter().position(|t| t.frame.is_none()) {
            return idx;
        }
        let idx = self.next_random() % self.tags.len();
        let tag = self.tags[idx];
        if let Some(victim) = tag.frame {
            if tag.dirty {
                let dev = Arc::clone(&self.dev);
                let page = self.slots.page(idx);
                for i in 0..BLOCKS_PER_PAGE {
                    dev.write_block(
                        victim * BLOCKS_PER_PAGE + i,
                        &page[i * BLOCK_SZ..(i + 1) * BLOCK_SZ],
                    );
                }
            }
        }
        self.tags[idx] = EMPTY;
        idx
    }

    // xorshift32; a fixed seed keeps eviction reproducible in tests.
    fn next_random(&mut self) -> usize {
        let mut x = self.rand;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.rand = x;
        x as usize
    }
}
