//! A disk-backed frame store with a bounded in-memory cache.
//!
//! The store presents 256 addressable 4 KiB frames. Frame `i` persists in
//! blocks `[i * 8, i * 8 + 8)` of the backing [`BlockDevice`]; a configurable
//! number of frames is staged in fast memory (a [`PageRegion`]) at any time.
//! On the emulator the region is large enough for every frame; on the
//! constrained board only a handful of slots fit and the cache evicts.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

mod block_dev;
mod frame_cache;
mod ram_disk;
mod region;

/// Size of one disk block in bytes.
pub const BLOCK_SZ: usize = 512;
/// Size of one physical frame in bytes.
pub const PAGE_SIZE: usize = 4096;
/// Number of frames in the store (1 MiB of backing storage).
pub const NFRAMES: usize = 256;
/// Blocks occupied by a single frame.
pub const BLOCKS_PER_PAGE: usize = PAGE_SIZE / BLOCK_SZ;

/// One frame-sized unit of memory.
pub type Page = [u8; PAGE_SIZE];

pub use block_dev::BlockDevice;
pub use frame_cache::FrameCache;
pub use ram_disk::RamDisk;
pub use region::PageRegion;
