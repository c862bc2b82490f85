//! Block-by-block program loading.
//!
//! The kernel does no executable parsing; whoever spawns a process hands
//! over a reader that produces the image block by block (the shell reads
//! from the file server, boot reads straight off the disk), and the loader
//! streams it into freshly mapped pages.

use crate::config::*;
use crate::mm::{FrameFlags, Mmu, MmuError};

/// Maps `pid`'s whole virtual window and fills its code pages from
/// `read_block` (`block` is image-relative). Returns the number of code
/// pages written.
pub fn load(
    mmu: &mut Mmu,
    pid: Pid,
    nblocks: usize,
    mut read_block: impl FnMut(usize, &mut [u8]),
) -> Result<usize, MmuError> {
    assert!(
        nblocks <= APPS_CODE_NPAGES * BLOCKS_PER_PAGE,
        "program image does not fit the code pages"
    );
    for page_no in APPS_VPN_BASE..APPS_VPN_BASE + WINDOW_NPAGES {
        let (frame, _) = mmu.alloc().ok_or(MmuError::OutOfFrames)?;
        mmu.map(
            pid,
            page_no,
            frame,
            FrameFlags::READ | FrameFlags::WRITE | FrameFlags::EXEC | FrameFlags::USER,
        )?;
    }
    let mut page = [0u8; PAGE_SIZE];
    let npages = nblocks.div_ceil(BLOCKS_PER_PAGE);
    for p in 0..npages {
        page.fill(0);
        for b in 0..BLOCKS_PER_PAGE {
            let block = p * BLOCKS_PER_PAGE + b;
            if block >= nblocks {
                break;
            }
            read_block(block, &mut page[b * BLOCK_SZ..(b + 1) * BLOCK_SZ]);
        }
        let frame = mmu
            .frames()
            .find(pid, ENTRY_VPN + p)
            .ok_or(MmuError::FrameNotAllocated)?;
        mmu.cache_mut().write(frame, &page);
    }
    Ok(npages)
}

/// Writes argc/argv into `pid`'s argument page, in the layout the first
/// dispatch hands to the app: a word of argc, `CMD_NARGS` argv pointers,
/// then the NUL-terminated strings.
pub fn setup_args(mmu: &mut Mmu, pid: Pid, args: &[&str]) -> Result<(), MmuError> {
    assert!(args.len() <= CMD_NARGS, "too many arguments");
    let mut page = [0u8; PAGE_SIZE];
    page[0..4].copy_from_slice(&(args.len() as u32).to_le_bytes());
    let mut cursor = 4 + CMD_NARGS * 4;
    for (i, arg) in args.iter().enumerate() {
        assert!(cursor + arg.len() + 1 <= PAGE_SIZE, "arguments overflow the page");
        let va = (APPS_ARG + cursor) as u32;
        page[4 + i * 4..8 + i * 4].copy_from_slice(&va.to_le_bytes());
        page[cursor..cursor + arg.len()].copy_from_slice(arg.as_bytes());
        cursor += arg.len() + 1;
    }
    let frame = mmu
        .frames()
        .find(pid, ARGS_VPN)
        .ok_or(MmuError::FrameNotAllocated)?;
    mmu.cache_mut().write(frame, &page);
    Ok(())
}
