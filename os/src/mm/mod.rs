//! Memory management.
//!
//! [`FrameTable`] tracks ownership of the 256 physical frames;
//! [`FrameCache`] (from `frame-store`) stages them in fast memory; one of
//! two translation engines (the copying [`SoftTlb`] or the Sv32
//! [`Sv32Pt`]) makes a process's pages addressable. [`Mmu`] owns all
//! three and exposes the capability set the rest of the kernel is
//! parametric over: `alloc`, `map`, `switch`, `free`.

mod frame_table;
#[cfg(target_arch = "riscv32")]
pub mod heap_allocator;
mod page_table;
mod soft_tlb;

pub use frame_table::{FrameFlags, FrameRecord, FrameTable};
pub use page_table::{PTEFlags, Sv32Pt};
pub use soft_tlb::SoftTlb;

use crate::config::*;
use crate::sync::UPSafeCell;
use alloc::sync::Arc;
use frame_store::{BlockDevice, FrameCache, Page, PageRegion};
use lazy_static::*;

/// Errors surfaced to MMU callers; everything else in this layer is a
/// kernel invariant violation and panics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MmuError {
    /// No free frame left.
    OutOfFrames,
    /// Mapping referenced a frame that was never allocated.
    FrameNotAllocated,
}

/// Which translation engine to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslationKind {
    SoftTlb,
    PageTable,
}

/// The selected translation engine.
pub enum Translation {
    SoftTlb(SoftTlb),
    PageTable(Sv32Pt),
}

/// The memory management unit: frame ownership, the frame cache and the
/// active translation engine behind one interface.
pub struct Mmu {
    frames: FrameTable,
    cache: FrameCache,
    translation: Translation,
}

impl Mmu {
    /// Builds the MMU over a backing device and the fast-memory slot
    /// region.
    ///
    /// Page tables reference frames by their cached physical address, so
    /// that engine requires every frame to be resident (the emulator
    /// configuration).
    pub fn new(dev: Arc<dyn BlockDevice>, cache_slots: PageRegion, translation: Translation) -> Self {
        if matches!(translation, Translation::PageTable(_)) {
            assert_eq!(
                cache_slots.npages(),
                NFRAMES,
                "page tables require every frame resident"
            );
        }
        Self {
            frames: FrameTable::new(),
            cache: FrameCache::new(dev, cache_slots),
            translation,
        }
    }

    pub fn frames(&self) -> &FrameTable {
        &self.frames
    }

    pub fn cache(&self) -> &FrameCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut FrameCache {
        &mut self.cache
    }

    /// Allocates the lowest-numbered free frame and stages it in the cache
    /// without touching the disk (its contents are about to be written).
    pub fn alloc(&mut self) -> Option<(usize, &mut Page)> {
        let frame = self.frames.alloc()?;
        Some((frame, self.cache.read(frame, true)))
    }

    /// Records that `frame` backs virtual page `page_no` of `pid` and, when
    /// page tables are active, installs the leaf entry.
    pub fn map(
        &mut self,
        pid: Pid,
        page_no: usize,
        frame: usize,
        flags: FrameFlags,
    ) -> Result<(), MmuError> {
        self.frames.map(pid, page_no, frame, flags)?;
        if let Translation::PageTable(pt) = &mut self.translation {
            pt.map(pid, page_no, frame, &mut self.frames, &mut self.cache)?;
        }
        Ok(())
    }

    /// Brings `pid`'s address space into view. A switch to the current pid
    /// is a no-op.
    pub fn switch(&mut self, pid: Pid) {
        match &mut self.translation {
            Translation::SoftTlb(tlb) => tlb.switch(pid, &self.frames, &mut self.cache),
            Translation::PageTable(pt) => pt.switch(pid, &self.cache),
        }
    }

    /// Releases every frame owned by `pid`: cache slots are dropped without
    /// write-back and the mapping records cleared.
    pub fn free(&mut self, pid: Pid) {
        for frame in 0..NFRAMES {
            if self.frames.record(frame).flags.contains(FrameFlags::INUSE)
                && self.frames.record(frame).pid == pid
            {
                self.cache.invalidate(frame);
                self.frames.clear(frame);
            }
        }
        match &mut self.translation {
            Translation::SoftTlb(tlb) => tlb.forget(pid),
            Translation::PageTable(pt) => pt.forget(pid),
        }
    }

    /// Pid whose address space is currently in view.
    pub fn current_vm(&self) -> Option<Pid> {
        match &self.translation {
            Translation::SoftTlb(tlb) => tlb.current(),
            Translation::PageTable(pt) => pt.current(),
        }
    }

    /// Fast-memory page backing virtual page `page_no` of the current
    /// address space. This is how the kernel reaches fixed-address
    /// structures (the syscall slot) without assuming it shares the
    /// process's translation.
    pub fn page_of_current(&mut self, page_no: usize) -> Option<&mut Page> {
        match &mut self.translation {
            Translation::SoftTlb(tlb) => {
                tlb.current()?;
                tlb.window_page_mut(page_no)
            }
            Translation::PageTable(pt) => {
                let pid = pt.current()?;
                let frame = self.frames.find(pid, page_no)?;
                Some(self.cache.read(frame, false))
            }
        }
    }

    /// The active engine, for introspection in tests and diagnostics.
    pub fn translation(&self) -> &Translation {
        &self.translation
    }

    /// The translation-register token for `pid` under the page-table
    /// engine; `None` for the software TLB, which installs no hardware
    /// state.
    pub fn token(&self, pid: Pid) -> Option<u32> {
        match &self.translation {
            Translation::PageTable(pt) => pt.token(pid, &self.cache),
            Translation::SoftTlb(_) => None,
        }
    }

    /// Raw leaf page-table entry for `page_no` of `pid` under the
    /// page-table engine.
    pub fn translate(&mut self, pid: Pid, page_no: usize) -> Option<u32> {
        let Self {
            translation, cache, ..
        } = self;
        match translation {
            Translation::PageTable(pt) => pt.translate(pid, page_no, cache),
            Translation::SoftTlb(_) => None,
        }
    }
}

lazy_static! {
    /// The kernel MMU, populated by [`init`] once the boot code has chosen
    /// a translation engine.
    pub static ref MMU: UPSafeCell<Option<Mmu>> = unsafe { UPSafeCell::new(None) };
}

/// Builds the kernel MMU over the board regions and the chosen engine.
#[cfg(target_arch = "riscv32")]
pub fn init(kind: TranslationKind) {
    let dev = Arc::clone(&crate::drivers::block::BLOCK_DEVICE);
    let cache_slots =
        unsafe { PageRegion::from_raw(FRAME_CACHE_START as *mut u8, CACHED_NFRAMES) };
    let translation = match kind {
        TranslationKind::SoftTlb => {
            let window = unsafe { PageRegion::from_raw(VADDR_START as *mut u8, WINDOW_NPAGES) };
            Translation::SoftTlb(SoftTlb::new(window))
        }
        TranslationKind::PageTable => Translation::PageTable(Sv32Pt::new()),
    };
    *MMU.exclusive_access() = Some(Mmu::new(dev, cache_slots, translation));
    log::info!("mmu ready, translation: {:?}", kind);
}
