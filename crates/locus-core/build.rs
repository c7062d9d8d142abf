//! Build script for locus-core
//!
//! Checks the minimum Rust version before compilation. Signed/unsigned mixed
//! integer arithmetic (`checked_add_signed`, `checked_sub_unsigned`) needs
//! Rust 1.66.0, and `Option::is_some_and` needs 1.70.0.

fn main()
{
    let Ok(min_rust_version) = rustc_version::Version::parse("1.70.0") else {
        println!("cargo:warning=could not parse minimum Rust version");
        return;
    };

    if let Ok(rustc_version) = rustc_version::version() {
        if rustc_version < min_rust_version {
            panic!("locus-core requires Rust {min_rust_version} or newer, found {rustc_version}");
        }
    } else {
        // If we can't get version (e.g., in some build environments), just warn
        println!("cargo:warning=could not verify Rust version");
    }
}
