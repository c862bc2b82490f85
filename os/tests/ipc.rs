//! Rendezvous messaging, driven end-to-end through the software-interrupt
//! dispatch path.

mod common;

use common::*;
use moss::config::*;
use moss::syscall::{self, SYS_RECV, SYS_SEND, SYS_UNUSED};
use moss::task::{Dispatch, ProcTable, Status};
use moss::trap;

/// A table with pids 1..=n, windows mapped, everything runnable.
fn setup(n: usize) -> (ProcTable, moss::mm::Mmu) {
    let mut mmu = soft_tlb_mmu(CACHED_NFRAMES);
    let mut procs = ProcTable::new();
    for pid in 1..=n {
        assert_eq!(procs.alloc(), pid);
        map_window(&mut mmu, pid);
        procs.set_runnable(pid);
    }
    (procs, mmu)
}

fn run_as(procs: &mut ProcTable, mmu: &mut moss::mm::Mmu, pid: Pid) {
    let running: Vec<Pid> = procs
        .iter()
        .filter(|p| p.status == Status::Running)
        .map(|p| p.pid)
        .collect();
    for p in running {
        procs.set_runnable(p);
    }
    procs.set_current(pid);
    procs.set_running(pid);
    mmu.switch(pid);
}

#[test]
fn send_before_recv_blocks_then_delivers() {
    let (mut procs, mut mmu) = setup(3);
    run_as(&mut procs, &mut mmu, 2);

    // A (pid 2) sends to B (pid 3), which is not receiving yet.
    {
        let slot = syscall::current_slot(&mut mmu);
        slot.kind = SYS_SEND;
        slot.msg.receiver = 3;
        slot.msg.content[..4].copy_from_slice(b"ping");
    }
    let dispatch = trap::intr_entry(&mut procs, &mut mmu, trap::INTR_SOFT, false);
    assert_eq!(dispatch, Dispatch::Resume);
    let a = procs.find(2).unwrap();
    assert_eq!(a.status, Status::WaitToSend);
    assert_eq!(a.receiver, 3);
    // Round-robin moved on to B.
    assert_eq!(procs.curr_pid(), 3);

    // B receives: the pending send is matched on the next dispatch.
    {
        let slot = syscall::current_slot(&mut mmu);
        slot.kind = SYS_RECV;
    }
    trap::intr_entry(&mut procs, &mut mmu, trap::INTR_SOFT, false);
    assert_eq!(procs.find(2).unwrap().status, Status::Runnable);

    mmu.switch(3);
    let slot = syscall::current_slot(&mut mmu);
    assert_eq!(slot.kind, SYS_UNUSED);
    assert_eq!(slot.msg.sender, 2);
    assert_eq!(&slot.msg.content[..4], b"ping");
    assert_eq!(slot.retval, 0);
}

#[test]
fn recv_before_send_blocks_then_delivers() {
    let (mut procs, mut mmu) = setup(3);
    run_as(&mut procs, &mut mmu, 2);

    // A (pid 2) asks to receive with no sender pending.
    {
        let slot = syscall::current_slot(&mut mmu);
        slot.kind = SYS_RECV;
    }
    trap::intr_entry(&mut procs, &mut mmu, trap::INTR_SOFT, false);
    assert_eq!(procs.find(2).unwrap().status, Status::WaitToRecv);
    assert_eq!(procs.curr_pid(), 3);

    // B (pid 3) sends to the waiting A: immediate rendezvous.
    {
        let slot = syscall::current_slot(&mut mmu);
        slot.kind = SYS_SEND;
        slot.msg.receiver = 2;
        slot.msg.content[..3].copy_from_slice(b"ack");
    }
    trap::intr_entry(&mut procs, &mut mmu, trap::INTR_SOFT, false);
    assert_eq!(procs.find(2).unwrap().status, Status::Runnable);

    // The payload landed bytewise in A's slot.
    mmu.switch(2);
    let slot = syscall::current_slot(&mut mmu);
    assert_eq!(slot.kind, SYS_UNUSED);
    assert_eq!(slot.msg.sender, 3);
    assert_eq!(&slot.msg.content[..3], b"ack");
    assert_eq!(slot.retval, 0);

    // B resumed with success.
    mmu.switch(3);
    assert_eq!(syscall::current_slot(&mut mmu).retval, 0);
}

#[test]
fn send_to_an_absent_receiver_fails_without_blocking() {
    let (mut procs, mut mmu) = setup(2);
    run_as(&mut procs, &mut mmu, 2);
    {
        let slot = syscall::current_slot(&mut mmu);
        slot.kind = SYS_SEND;
        slot.msg.receiver = 9;
    }
    let dispatch = trap::intr_entry(&mut procs, &mut mmu, trap::INTR_SOFT, false);
    assert_eq!(dispatch, Dispatch::Resume);
    // No yield: the caller stays current and sees -1.
    assert_eq!(procs.curr_pid(), 2);
    assert_eq!(procs.find(2).unwrap().status, Status::Running);
    assert_eq!(syscall::current_slot(&mut mmu).retval, -1);
}

#[test]
fn one_rendezvous_fires_per_recv_in_table_order() {
    let (mut procs, mut mmu) = setup(4);

    // A (pid 2) and C (pid 4) both send to B (pid 3).
    run_as(&mut procs, &mut mmu, 2);
    {
        let slot = syscall::current_slot(&mut mmu);
        slot.kind = SYS_SEND;
        slot.msg.receiver = 3;
        slot.msg.content[..6].copy_from_slice(b"from-a");
    }
    trap::intr_entry(&mut procs, &mut mmu, trap::INTR_SOFT, false);

    run_as(&mut procs, &mut mmu, 4);
    {
        let slot = syscall::current_slot(&mut mmu);
        slot.kind = SYS_SEND;
        slot.msg.receiver = 3;
        slot.msg.content[..6].copy_from_slice(b"from-c");
    }
    trap::intr_entry(&mut procs, &mut mmu, trap::INTR_SOFT, false);
    assert_eq!(procs.find(2).unwrap().status, Status::WaitToSend);
    assert_eq!(procs.find(4).unwrap().status, Status::WaitToSend);

    // B's first receive matches A (first in table order); C keeps waiting.
    run_as(&mut procs, &mut mmu, 3);
    syscall::current_slot(&mut mmu).kind = SYS_RECV;
    trap::intr_entry(&mut procs, &mut mmu, trap::INTR_SOFT, false);
    assert_eq!(procs.find(2).unwrap().status, Status::Runnable);
    assert_eq!(procs.find(4).unwrap().status, Status::WaitToSend);
    mmu.switch(3);
    assert_eq!(&syscall::current_slot(&mut mmu).msg.content[..6], b"from-a");

    // The second receive drains C.
    run_as(&mut procs, &mut mmu, 3);
    syscall::current_slot(&mut mmu).kind = SYS_RECV;
    trap::intr_entry(&mut procs, &mut mmu, trap::INTR_SOFT, false);
    assert_eq!(procs.find(4).unwrap().status, Status::Runnable);
    mmu.switch(3);
    assert_eq!(&syscall::current_slot(&mut mmu).msg.content[..6], b"from-c");
    assert_eq!(syscall::current_slot(&mut mmu).msg.sender, 4);
}

#[test]
fn a_full_length_payload_survives_the_two_switch_copy() {
    let (mut procs, mut mmu) = setup(3);
    run_as(&mut procs, &mut mmu, 2);
    let payload: Vec<u8> = (0..SYSCALL_MSG_LEN).map(|i| i as u8).collect();
    {
        let slot = syscall::current_slot(&mut mmu);
        slot.kind = SYS_SEND;
        slot.msg.receiver = 3;
        slot.msg.content.copy_from_slice(&payload);
    }
    trap::intr_entry(&mut procs, &mut mmu, trap::INTR_SOFT, false);

    run_as(&mut procs, &mut mmu, 3);
    syscall::current_slot(&mut mmu).kind = SYS_RECV;
    trap::intr_entry(&mut procs, &mut mmu, trap::INTR_SOFT, false);

    mmu.switch(3);
    assert_eq!(&syscall::current_slot(&mut mmu).msg.content[..], &payload[..]);
}
