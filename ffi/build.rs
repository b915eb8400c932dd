use std::env;
use std::path::PathBuf;

fn main() {
    let crate_dir = env::var("CARGO_MANIFEST_DIR").map(PathBuf::from).unwrap_or_default();
    let include_dir = crate_dir.join("include");

    println!("cargo:rerun-if-changed=src/lib.rs");
    println!("cargo:rerun-if-changed=src/types.rs");

    match cbindgen::Builder::new()
        .with_crate(&crate_dir)
        .with_language(cbindgen::Language::C)
        .with_include_guard("PAGERDUTY_FFI_H")
        .with_cpp_compat(true)
        .generate()
    {
        Ok(bindings) => {
            if let Err(e) = std::fs::create_dir_all(&include_dir) {
                println!("cargo:warning=failed to create {}: {e}", include_dir.display());
                return;
            }
            bindings.write_to_file(include_dir.join("pagerduty.h"));
        }
        Err(e) => println!("cargo:warning=failed to generate C header: {e}"),
    }
}
