//! Constants used across the kernel.

pub use frame_store::{BLOCKS_PER_PAGE, BLOCK_SZ, NFRAMES, PAGE_SIZE};

/// Bit width of the intra-page offset.
pub const PAGE_SIZE_BITS: usize = 12;

/// Process identifier. Ids are assigned monotonically and never reused.
pub type Pid = usize;

/// Upper bound on simultaneously live processes; also bounds the number of
/// address spaces either translation engine tracks.
pub const MAX_NPROCESS: usize = 16;

/// Per-process kernel stack, 8 KiB.
pub const KERNEL_STACK_SIZE: usize = 4096 * 2;
/// Kernel heap, 1 MiB.
pub const KERNEL_HEAP_SIZE: usize = 0x10_0000;

/// Frame-cache slots resident in fast memory. The emulator has room for the
/// whole frame store; the board stages 28 frames over the microSD.
#[cfg(feature = "board_qemu")]
pub const CACHED_NFRAMES: usize = NFRAMES;
#[cfg(feature = "board_arty")]
pub const CACHED_NFRAMES: usize = 28;

/// The process manager, the first process spawned at boot.
pub const GPID_PROCESS: Pid = 1;
/// The file server.
pub const GPID_FILE: Pid = 2;
/// The directory server.
pub const GPID_DIR: Pid = 3;
/// The shell. Processes below this pid are privileged servers and are never
/// preempted by the timer.
pub const GPID_SHELL: Pid = 4;
/// First pid of user applications; everything at or above runs in user mode
/// and may be killed.
pub const GPID_USER_START: Pid = 5;

/// Largest message carried by a single send/recv.
pub const SYSCALL_MSG_LEN: usize = 1024;
/// Argv slots in the argument page.
pub const CMD_NARGS: usize = 8;

/// Start of the per-process virtual window.
pub const VADDR_START: usize = 0x0800_0000;
/// Pages in the window: syscall slot, arguments, code and the app stack.
pub const WINDOW_NPAGES: usize = 12;
/// Virtual page number of `VADDR_START`.
pub const APPS_VPN_BASE: usize = VADDR_START >> PAGE_SIZE_BITS;

/// Page holding the syscall slot.
pub const SYSCALL_VPN: usize = APPS_VPN_BASE + 3;
/// Page holding argc/argv.
pub const ARGS_VPN: usize = APPS_VPN_BASE + 4;
/// First code page; execution starts here.
pub const ENTRY_VPN: usize = APPS_VPN_BASE + 5;
/// Code and data pages available to a program.
pub const APPS_CODE_NPAGES: usize = 5;

/// Address of the argument page.
pub const APPS_ARG: usize = ARGS_VPN << PAGE_SIZE_BITS;
/// Application entry point.
pub const APPS_ENTRY: usize = ENTRY_VPN << PAGE_SIZE_BITS;
/// Exit trampoline inside the app startup code; a killed process has its
/// trap pc redirected here so it releases its resources voluntarily.
pub const APPS_EXIT: usize = APPS_ENTRY + 0xc;
/// Top of the application stack (the window's last pages).
pub const APPS_STACK_TOP: usize = VADDR_START + WINDOW_NPAGES * PAGE_SIZE;

/// Where the frame-cache slots live in fast memory.
pub const FRAME_CACHE_START: usize = 0x8010_0000;

/// Core-local interruptor: software-interrupt and timer registers.
pub const CLINT_BASE: usize = 0x0200_0000;
/// UART0 transmit/receive registers.
pub const UART0_BASE: usize = 0x1001_3000;
/// Boot ROM.
pub const BOOT_ROM_START: usize = 0x2040_0000;
/// The disk image, memory-mapped on the emulator.
pub const DISK_IMAGE_START: usize = 0x2080_0000;
/// Total blocks on the backing medium. The first
/// `NFRAMES * BLOCKS_PER_PAGE` of them are the frame store.
pub const DISK_NBLOCKS: usize = 4096;

/// First block of the process manager's executable image.
pub const SYS_PROC_EXEC_START: usize = NFRAMES * BLOCKS_PER_PAGE;
/// Blocks occupied by the process manager's image.
pub const SYS_PROC_EXEC_NBLOCKS: usize = APPS_CODE_NPAGES * BLOCKS_PER_PAGE;

/// Timer quantum in CLINT ticks.
pub const TIMER_QUANTUM: u64 = 5000;

/// Physical ranges identity-mapped (kernel-only) into every page table
/// before any user mapping: MMIO, boot ROM, disk image, instruction and
/// data memories. `(start, npages)` pairs; starts are page-aligned.
pub const IDENTITY_REGIONS: &[(usize, usize)] = &[
    (CLINT_BASE, 16),
    (UART0_BASE, 1),
    (BOOT_ROM_START, 16),
    (DISK_IMAGE_START, 512),
    (VADDR_START, 256),
    (0x8000_0000, 1024),
];
