//! The Sv32 two-level page-table engine (emulator only).
//!
//! A 32-bit virtual address splits into `VPN1` (10 bits, root index),
//! `VPN0` (10 bits, leaf index) and the page offset. A page-table entry
//! packs the physical page number shifted left by 10 over the flag bits,
//! i.e. the physical address shifted right by 2.
//!
//! Table nodes are ordinary frames drawn from the frame table (flagged
//! `TABLE`, so `free` reclaims them with everything else). Entries
//! reference frames by their *cached* physical address; the engine
//! therefore requires the full-residency cache configuration, where a
//! frame never moves slots, and the table pages themselves are never
//! written back.

use crate::arch;
use crate::config::{Pid, FRAME_CACHE_START, IDENTITY_REGIONS, MAX_NPROCESS, PAGE_SIZE, PAGE_SIZE_BITS};
use crate::mm::{FrameFlags, FrameTable, MmuError};
use bitflags::*;
use frame_store::{FrameCache, Page};

bitflags! {
    /// Sv32 page-table entry flags.
    pub struct PTEFlags: u8 {
        /// Valid: the entry maps something.
        const V = 1 << 0;
        const R = 1 << 1;
        const W = 1 << 2;
        const X = 1 << 3;
        /// Accessible with user privilege.
        const U = 1 << 4;
    }
}

const PTES_PER_PAGE: usize = PAGE_SIZE / 4;
/// Paging-enable bit of the translation register.
const SATP_MODE_SV32: u32 = 1 << 31;

fn pte_array(page: &mut Page) -> &mut [u32; PTES_PER_PAGE] {
    // pages are 4 KiB aligned, so the cast is always in-bounds and aligned
    unsafe { &mut *(page.as_mut_ptr() as *mut [u32; PTES_PER_PAGE]) }
}

fn make_pte(pa: usize, flags: PTEFlags) -> u32 {
    ((pa >> PAGE_SIZE_BITS) << 10) as u32 | flags.bits as u32
}

fn pte_pa(pte: u32) -> usize {
    ((pte >> 10) as usize) << PAGE_SIZE_BITS
}

fn is_valid(pte: u32) -> bool {
    pte & PTEFlags::V.bits as u32 != 0
}

/// Physical address a resident frame is cached at.
fn frame_pa(cache: &FrameCache, frame: usize) -> usize {
    let slot = cache
        .slot_of(frame)
        .expect("page-table frame not resident");
    FRAME_CACHE_START + slot * PAGE_SIZE
}

/// Inverse of [`frame_pa`].
fn frame_of_pa(cache: &FrameCache, pa: usize) -> usize {
    let slot = (pa - FRAME_CACHE_START) / PAGE_SIZE;
    cache
        .frame_at(slot)
        .expect("page-table entry references an empty cache slot")
}

#[derive(Clone, Copy)]
struct RootEntry {
    pid: Pid,
    frame: usize,
}

/// Per-process Sv32 page tables.
pub struct Sv32Pt {
    roots: [Option<RootEntry>; MAX_NPROCESS],
    current: Option<Pid>,
}

impl Sv32Pt {
    pub fn new() -> Self {
        Self {
            roots: [None; MAX_NPROCESS],
            current: None,
        }
    }

    pub fn current(&self) -> Option<Pid> {
        self.current
    }

    fn root_of(&self, pid: Pid) -> Option<usize> {
        self.roots
            .iter()
            .flatten()
            .find(|r| r.pid == pid)
            .map(|r| r.frame)
    }

    /// Installs `frame` as virtual page `page_no` of `pid` with user RWX
    /// permissions, lazily building the root (and its identity mappings)
    /// on the first map for this pid.
    pub fn map(
        &mut self,
        pid: Pid,
        page_no: usize,
        frame: usize,
        frames: &mut FrameTable,
        cache: &mut FrameCache,
    ) -> Result<(), MmuError> {
        let root = match self.root_of(pid) {
            Some(root) => root,
            None => self.create_root(pid, frames, cache)?,
        };
        let leaf = Self::ensure_leaf(root, page_no >> 10, pid, frames, cache)?;
        let pa = frame_pa(cache, frame);
        pte_array(cache.read(leaf, true))[page_no & 0x3ff] = make_pte(
            pa,
            PTEFlags::V | PTEFlags::R | PTEFlags::W | PTEFlags::X | PTEFlags::U,
        );
        Ok(())
    }

    /// Points the translation register at `pid`'s root. The outgoing
    /// process's mapping stays intact; nothing is copied.
    pub fn switch(&mut self, pid: Pid, cache: &FrameCache) {
        if self.current == Some(pid) {
            return;
        }
        let token = self
            .token(pid, cache)
            .expect("switch to a process with no page table");
        arch::write_satp(token);
        self.current = Some(pid);
    }

    /// The translation-register value for `pid`: mode bit over the root's
    /// physical page number.
    pub fn token(&self, pid: Pid, cache: &FrameCache) -> Option<u32> {
        let root = self.root_of(pid)?;
        Some(SATP_MODE_SV32 | (frame_pa(cache, root) >> PAGE_SIZE_BITS) as u32)
    }

    /// Walks `pid`'s table and returns the raw leaf entry for `page_no`.
    pub fn translate(&self, pid: Pid, page_no: usize, cache: &mut FrameCache) -> Option<u32> {
        let root = self.root_of(pid)?;
        let pte = pte_array(cache.read(root, true))[page_no >> 10];
        if !is_valid(pte) {
            return None;
        }
        let leaf = frame_of_pa(cache, pte_pa(pte));
        let pte = pte_array(cache.read(leaf, true))[page_no & 0x3ff];
        if !is_valid(pte) {
            return None;
        }
        Some(pte)
    }

    pub(crate) fn forget(&mut self, pid: Pid) {
        for root in self.roots.iter_mut() {
            if root.map_or(false, |r| r.pid == pid) {
                *root = None;
            }
        }
        if self.current == Some(pid) {
            self.current = None;
        }
    }

    /// Builds a fresh root for `pid` with the identity region installed
    /// kernel-only, before any user mapping exists.
    fn create_root(
        &mut self,
        pid: Pid,
        frames: &mut FrameTable,
        cache: &mut FrameCache,
    ) -> Result<usize, MmuError> {
        let slot = self
            .roots
            .iter()
            .position(Option::is_none)
            .expect("page-table root slots exhausted");
        let root = Self::alloc_table(pid, frames, cache)?;
        for &(base, npages) in IDENTITY_REGIONS {
            for i in 0..npages {
                let pa = base + i * PAGE_SIZE;
                let vpn = pa >> PAGE_SIZE_BITS;
                let leaf = Self::ensure_leaf(root, vpn >> 10, pid, frames, cache)?;
                pte_array(cache.read(leaf, true))[vpn & 0x3ff] =
                    make_pte(pa, PTEFlags::V | PTEFlags::R | PTEFlags::W | PTEFlags::X);
            }
        }
        self.roots[slot] = Some(RootEntry { pid, frame: root });
        Ok(root)
    }

    /// Leaf table for `vpn1` under `root`, allocating it when the root
    /// entry is still invalid.
    fn ensure_leaf(
        root: usize,
        vpn1: usize,
        pid: Pid,
        frames: &mut FrameTable,
        cache: &mut FrameCache,
    ) -> Result<usize, MmuError> {
        let pte = pte_array(cache.read(root, true))[vpn1];
        if is_valid(pte) {
            return Ok(frame_of_pa(cache, pte_pa(pte)));
        }
        let leaf = Self::alloc_table(pid, frames, cache)?;
        let pa = frame_pa(cache, leaf);
        pte_array(cache.read(root, true))[vpn1] = make_pte(pa, PTEFlags::V);
        Ok(leaf)
    }

    /// A zeroed table-node frame owned by `pid`.
    fn alloc_table(
        pid: Pid,
        frames: &mut FrameTable,
        cache: &mut FrameCache,
    ) -> Result<usize, MmuError> {
        let frame = frames.alloc().ok_or(MmuError::OutOfFrames)?;
        frames.map(pid, 0, frame, FrameFlags::TABLE)?;
        cache.read(frame, true).fill(0);
        Ok(frame)
    }
}
