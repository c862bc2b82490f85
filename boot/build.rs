use std::env;

fn main() {
    // The linker script only applies to the bare-metal target.
    if env::var("CARGO_CFG_TARGET_ARCH").as_deref() == Ok("riscv32") {
        let manifest = env::var("CARGO_MANIFEST_DIR").unwrap();
        println!("cargo:rustc-link-arg=-T{}/src/linker.ld", manifest);
        println!("cargo:rerun-if-changed=src/linker.ld");
    }
}
