//! The software TLB: a translation engine that installs no hardware
//! mappings at all.
//!
//! Every process's pages live in the frame cache; the engine copies the
//! current process's pages into a shared user-virtual window on switch-in
//! and writes them back on switch-out. Slow, but it works on hardware with
//! no translation support and it is the only engine the board offers.

use crate::config::{Pid, APPS_VPN_BASE, WINDOW_NPAGES};
use crate::mm::{FrameFlags, FrameTable};
use frame_store::{FrameCache, Page, PageRegion};

pub struct SoftTlb {
    window: PageRegion,
    current: Option<Pid>,
}

impl SoftTlb {
    /// Takes ownership of the user-virtual window region.
    pub fn new(window: PageRegion) -> Self {
        assert_eq!(window.npages(), WINDOW_NPAGES);
        Self {
            window,
            current: None,
        }
    }

    pub fn current(&self) -> Option<Pid> {
        self.current
    }

    /// Makes `pid`'s pages addressable through the window.
    ///
    /// Writes the outgoing process's window contents back into the frame
    /// cache first; pages whose bytes did not change are skipped by the
    /// cache's equality check and stay clean.
    pub fn switch(&mut self, pid: Pid, frames: &FrameTable, cache: &mut FrameCache) {
        if self.current == Some(pid) {
            return;
        }
        if let Some(old) = self.current {
            for (frame, record) in frames.owned_by(old) {
                if record.flags.contains(FrameFlags::TABLE) {
                    continue;
                }
                cache.write(frame, self.window.page(record.page_no - APPS_VPN_BASE));
            }
        }
        for (frame, record) in frames.owned_by(pid) {
            if record.flags.contains(FrameFlags::TABLE) {
                continue;
            }
            let page_no = record.page_no;
            let page = cache.read(frame, false);
            self.window
                .page_mut(page_no - APPS_VPN_BASE)
                .copy_from_slice(&page[..]);
        }
        self.current = Some(pid);
    }

    /// Drops any notion of `pid` being in view (its frames are gone).
    pub(crate) fn forget(&mut self, pid: Pid) {
        if self.current == Some(pid) {
            self.current = None;
        }
    }

    /// Window page backing virtual page `page_no`, if it is inside the
    /// window.
    pub fn window_page_mut(&mut self, page_no: usize) -> Option<&mut Page> {
        let idx = page_no.checked_sub(APPS_VPN_BASE)?;
        if idx >= WINDOW_NPAGES {
            return None;
        }
        Some(self.window.page_mut(idx))
    }
}
