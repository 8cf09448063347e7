fn main() {
    // Linker scripts only exist for the chip target; host builds run the
    // library tests and need none of this.
    if std::env::var("CARGO_CFG_TARGET_ARCH").as_deref() == Ok("xtensa") {
        println!("cargo:rustc-link-arg=-Tlinkall.x");
    }
}
