#![allow(dead_code)]

use frame_store::{PageRegion, RamDisk, PAGE_SIZE};
use moss::config::*;
use moss::loader;
use moss::mm::{Mmu, SoftTlb, Sv32Pt, Translation};
use std::alloc::Layout;
use std::sync::Arc;

/// A page-aligned, leaked region standing in for a linker-placed one.
pub fn leak_region(npages: usize) -> PageRegion {
    let layout = Layout::from_size_align(npages * PAGE_SIZE, PAGE_SIZE).unwrap();
    let base = unsafe { std::alloc::alloc_zeroed(layout) };
    assert!(!base.is_null());
    unsafe { PageRegion::from_raw(base, npages) }
}

pub fn soft_tlb_mmu_with_disk(nslots: usize) -> (Arc<RamDisk>, Mmu) {
    let disk = Arc::new(RamDisk::new(DISK_NBLOCKS));
    let mmu = Mmu::new(
        disk.clone(),
        leak_region(nslots),
        Translation::SoftTlb(SoftTlb::new(leak_region(WINDOW_NPAGES))),
    );
    (disk, mmu)
}

pub fn soft_tlb_mmu(nslots: usize) -> Mmu {
    soft_tlb_mmu_with_disk(nslots).1
}

pub fn page_table_mmu() -> Mmu {
    let disk = Arc::new(RamDisk::new(DISK_NBLOCKS));
    Mmu::new(
        disk,
        leak_region(NFRAMES),
        Translation::PageTable(Sv32Pt::new()),
    )
}

/// Maps a process's full virtual window (no code), as spawning does.
pub fn map_window(mmu: &mut Mmu, pid: Pid) {
    loader::load(mmu, pid, 0, |_, _| {}).unwrap();
}
