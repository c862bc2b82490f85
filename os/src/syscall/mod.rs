//! The system-call surface: one marshalling slot per process and the
//! dispatcher over it.
//!
//! A process requests a syscall by filling the slot at its fixed
//! [`SYSCALL_VPN`] page and raising the software interrupt (or `ecall`
//! from user mode); it then spins until the kernel resets the slot's type
//! tag. Send and receive are the only calls; everything else in the
//! system is built as messages to the privileged servers.

mod ipc;

use crate::arch;
use crate::config::{SYSCALL_MSG_LEN, SYSCALL_VPN};
use crate::mm::Mmu;
use crate::task::{Dispatch, ProcTable};

/// No syscall in flight; the kernel resets the tag to this value before
/// dispatching, which is what the caller's spin loop watches for.
pub const SYS_UNUSED: u32 = 0;
pub const SYS_SEND: u32 = 1;
pub const SYS_RECV: u32 = 2;

/// The message payload carried by a send/recv pair.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct Message {
    /// Stamped by the kernel from the sending process's pid.
    pub sender: u32,
    /// Filled in by the sender.
    pub receiver: u32,
    pub content: [u8; SYSCALL_MSG_LEN],
}

/// The per-process syscall slot, laid out at a fixed virtual address.
#[repr(C)]
pub struct SyscallSlot {
    pub kind: u32,
    pub msg: Message,
    pub retval: i32,
}

const _: () = assert!(core::mem::size_of::<SyscallSlot>() <= frame_store::PAGE_SIZE);

/// The current address space's syscall slot, resolved through the MMU.
pub fn current_slot(mmu: &mut Mmu) -> &mut SyscallSlot {
    let page = mmu
        .page_of_current(SYSCALL_VPN)
        .expect("syscall slot page is not mapped");
    unsafe { &mut *(page.as_mut_ptr() as *mut SyscallSlot) }
}

/// Runs one syscall out of the current process's slot.
///
/// The pending flag and the type tag are cleared before dispatch, so a
/// nested dispatch cannot observe a stale request. Anything but send or
/// receive in the tag is a kernel invariant violation.
pub fn dispatch(procs: &mut ProcTable, mmu: &mut Mmu) -> Dispatch {
    let kind = {
        let slot = current_slot(mmu);
        let kind = slot.kind;
        slot.retval = 0;
        slot.kind = SYS_UNUSED;
        kind
    };
    arch::clear_soft_intr();
    match kind {
        SYS_SEND => ipc::send(procs, mmu),
        SYS_RECV => ipc::recv(procs, mmu),
        kind => panic!("syscall dispatch: got unknown type={}", kind),
    }
}
