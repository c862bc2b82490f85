//! The only architecture-aware code in the kernel.
//!
//! Everything the core needs from the machine is expressed as a typed
//! wrapper here: CSR reads and writes, the trap vector, the CLINT timer and
//! software-interrupt registers, the UART, and the two context-switch
//! primitives. On any target other than riscv32 the wrappers the
//! architecture-neutral core reaches are inert stubs, which is what lets
//! the scheduler, the MMU and the messaging layer run in host tests.

#[cfg(target_arch = "riscv32")]
mod riscv32;
#[cfg(target_arch = "riscv32")]
pub use riscv32::*;

#[cfg(not(target_arch = "riscv32"))]
mod host;
#[cfg(not(target_arch = "riscv32"))]
pub use host::*;
