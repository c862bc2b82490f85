//! Boot shim: set up a stack and hand over to the kernel.
//!
//! The kernel proper is the `moss` library crate; this binary only exists
//! to give the bare-metal target an entry point and a boot stack.

#![cfg_attr(target_arch = "riscv32", no_std)]
#![cfg_attr(target_arch = "riscv32", no_main)]

#[cfg(target_arch = "riscv32")]
use moss as _;

#[cfg(target_arch = "riscv32")]
core::arch::global_asm!(
    r#"
    .section .text.entry
    .globl _start
_start:
    la sp, boot_stack_top
    call rust_main

    .section .bss.stack
    .globl boot_stack_lower_bound
boot_stack_lower_bound:
    .space 4096 * 16
    .globl boot_stack_top
boot_stack_top:
"#
);

#[cfg(not(target_arch = "riscv32"))]
fn main() {
    eprintln!("moss only boots on a riscv32 target");
}
