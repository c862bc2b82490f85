//! Rendezvous message passing.
//!
//! Delivery is synchronous: whichever of sender and receiver arrives first
//! blocks (`WaitToSend` / `WaitToRecv`) until its counterpart shows up.
//! The copy itself runs on the kernel stack and crosses address spaces
//! with two MMU switches: out of the sender's slot into a staging buffer,
//! then into the receiver's slot. A waiting sender is resumed only after
//! its payload has landed, so no message is ever lost.

use super::{current_slot, Message};
use crate::config::Pid;
use crate::mm::Mmu;
use crate::task::{schedule, Dispatch, ProcTable, Status};

/// `SYS_SEND`: deliver to a waiting receiver or block until one arrives.
pub fn send(procs: &mut ProcTable, mmu: &mut Mmu) -> Dispatch {
    let sender = procs.curr_pid();
    let receiver = {
        let slot = current_slot(mmu);
        slot.msg.sender = sender as u32;
        slot.msg.receiver as Pid
    };
    let receiver_status = match procs.find(receiver) {
        Some(p) => p.status,
        None => {
            current_slot(mmu).retval = -1;
            return Dispatch::Resume;
        }
    };
    if receiver_status != Status::WaitToRecv {
        let curr = procs.curr_mut();
        curr.status = Status::WaitToSend;
        curr.receiver = receiver;
    } else {
        deliver(mmu, sender, receiver);
        procs.set_runnable(receiver);
    }
    schedule(procs, mmu)
}

/// `SYS_RECV`: take the first pending sender targeting us or block until
/// one arrives.
pub fn recv(procs: &mut ProcTable, mmu: &mut Mmu) -> Dispatch {
    let curr = procs.curr_pid();
    let sender = procs
        .iter()
        .find(|p| p.status == Status::WaitToSend && p.receiver == curr)
        .map(|p| p.pid);
    match sender {
        None => procs.curr_mut().status = Status::WaitToRecv,
        Some(sender) => {
            deliver(mmu, sender, curr);
            procs.set_runnable(sender);
        }
    }
    schedule(procs, mmu)
}

/// Copies the message in `from`'s slot into `to`'s slot through a kernel
/// staging buffer.
fn deliver(mmu: &mut Mmu, from: Pid, to: Pid) {
    mmu.switch(from);
    let staged: Message = current_slot(mmu).msg;
    mmu.switch(to);
    current_slot(mmu).msg = staged;
}
