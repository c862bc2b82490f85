//! The user-side system-call interface.
//!
//! Applications link this library to talk to the kernel: `send`, `recv`
//! and `exit` are the entire surface. Everything else (console, files,
//! spawning) is reached by messaging the privileged servers.

#![cfg_attr(not(test), no_std)]

mod syscall;

pub use syscall::{exit, recv, send, ProcRequest, GPID_PROCESS, PROC_EXIT, SYSCALL_MSG_LEN};

#[cfg(all(target_arch = "riscv32", not(test)))]
#[panic_handler]
fn panic(_info: &core::panic::PanicInfo) -> ! {
    syscall::exit(-1);
    loop {}
}
