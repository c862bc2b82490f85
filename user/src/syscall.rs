//! Marshalling over the shared syscall slot.
//!
//! The slot layout and the constants below are the kernel ABI: a type tag,
//! the message (sender, receiver, inline bytes) and the return value, at a
//! fixed virtual address in every process. A call stages its request in
//! the slot, raises the software interrupt through the memory-mapped
//! trigger, then spins until the kernel resets the tag.

/// Virtual address of the syscall slot.
const SYSCALL_ARG: usize = 0x0800_3000;
/// The memory-mapped software-interrupt trigger.
const SYSCALL_TRIGGER: *mut u32 = 0x0200_0000 as *mut u32;

/// Largest message carried by a single send/recv.
pub const SYSCALL_MSG_LEN: usize = 1024;

const SYS_UNUSED: u32 = 0;
const SYS_SEND: u32 = 1;
const SYS_RECV: u32 = 2;

/// Pid of the process manager.
pub const GPID_PROCESS: usize = 1;

#[repr(C)]
struct Message {
    sender: u32,
    receiver: u32,
    content: [u8; SYSCALL_MSG_LEN],
}

#[repr(C)]
struct SyscallSlot {
    kind: u32,
    msg: Message,
    retval: i32,
}

fn slot() -> &'static mut SyscallSlot {
    unsafe { &mut *(SYSCALL_ARG as *mut SyscallSlot) }
}

/// Raises the software interrupt and waits for the kernel to finish the
/// call. The spin may be preempted arbitrarily often; the kernel resets
/// the tag exactly once, when this process's request has been dispatched.
fn invoke(slot: &mut SyscallSlot) {
    unsafe {
        SYSCALL_TRIGGER.write_volatile(1);
        while core::ptr::addr_of!(slot.kind).read_volatile() != SYS_UNUSED {}
    }
}

fn stage_send(slot: &mut SyscallSlot, receiver: usize, msg: &[u8]) -> i32 {
    if msg.len() > SYSCALL_MSG_LEN {
        return -1;
    }
    slot.msg.receiver = receiver as u32;
    slot.msg.content[..msg.len()].copy_from_slice(msg);
    slot.kind = SYS_SEND;
    0
}

fn finish_recv(slot: &SyscallSlot, sender: Option<&mut usize>, buf: &mut [u8]) {
    buf.copy_from_slice(&slot.msg.content[..buf.len()]);
    if let Some(sender) = sender {
        *sender = slot.msg.sender as usize;
    }
}

/// Sends `msg` to `receiver`, blocking until it is delivered.
///
/// Returns 0 on delivery, -1 when the message is oversize (the slot is
/// left untouched) or the receiver does not exist.
pub fn send(receiver: usize, msg: &[u8]) -> i32 {
    let slot = slot();
    if stage_send(slot, receiver, msg) < 0 {
        return -1;
    }
    invoke(slot);
    slot.retval
}

/// Receives the next message addressed to this process into `buf`,
/// blocking until a sender arrives. The sending pid lands in `sender`.
///
/// Returns 0 on delivery, -1 when `buf` wants more than a message holds.
pub fn recv(sender: Option<&mut usize>, buf: &mut [u8]) -> i32 {
    if buf.len() > SYSCALL_MSG_LEN {
        return -1;
    }
    let slot = slot();
    slot.kind = SYS_RECV;
    invoke(slot);
    finish_recv(slot, sender, buf);
    slot.retval
}

/// Request tag understood by the process manager.
pub const PROC_EXIT: u32 = 1;

/// A request to the process manager.
#[repr(C)]
pub struct ProcRequest {
    pub kind: u32,
    pub status: i32,
}

/// Exits the current process by reporting to the process manager; the
/// kernel reclaims everything once the manager acts on it.
pub fn exit(status: i32) {
    let req = ProcRequest {
        kind: PROC_EXIT,
        status,
    };
    let mut bytes = [0u8; 8];
    bytes[0..4].copy_from_slice(&req.kind.to_le_bytes());
    bytes[4..8].copy_from_slice(&req.status.to_le_bytes());
    send(GPID_PROCESS, &bytes);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_slot() -> SyscallSlot {
        SyscallSlot {
            kind: SYS_UNUSED,
            msg: Message {
                sender: 0,
                receiver: 0,
                content: [0; SYSCALL_MSG_LEN],
            },
            retval: 0,
        }
    }

    #[test]
    fn a_full_length_message_is_staged() {
        let mut slot = empty_slot();
        let msg = [0x61u8; SYSCALL_MSG_LEN];
        assert_eq!(stage_send(&mut slot, 3, &msg), 0);
        assert_eq!(slot.kind, SYS_SEND);
        assert_eq!(slot.msg.receiver, 3);
        assert_eq!(slot.msg.content, msg);
    }

    #[test]
    fn an_oversize_message_is_rejected_without_touching_the_slot() {
        let mut slot = empty_slot();
        let msg = [0x61u8; SYSCALL_MSG_LEN + 1];
        assert_eq!(stage_send(&mut slot, 3, &msg), -1);
        assert_eq!(slot.kind, SYS_UNUSED);
        assert_eq!(slot.msg.receiver, 0);
        assert!(slot.msg.content.iter().all(|&b| b == 0));
    }

    #[test]
    fn recv_copies_payload_and_sender() {
        let mut slot = empty_slot();
        slot.msg.sender = 2;
        slot.msg.content[..4].copy_from_slice(b"ping");
        let mut sender = 0;
        let mut buf = [0u8; 4];
        finish_recv(&slot, Some(&mut sender), &mut buf);
        assert_eq!(&buf, b"ping");
        assert_eq!(sender, 2);
    }
}
