use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=ffi/wrapper.h");

    let include_paths = probe_sane();
    bindgen_sane(&include_paths);
}

fn probe_sane() -> Vec<PathBuf> {
    // Not every distribution ships sane-backends.pc, fall back to the default search path.
    match pkg_config::Config::new()
        .atleast_version("1.0")
        .probe("sane-backends")
    {
        Ok(library) => library.include_paths,
        Err(_) => {
            println!("cargo:rustc-link-lib=dylib=sane");
            Vec::new()
        }
    }
}

fn bindgen_sane(include_paths: &[PathBuf]) {
    let out_dir = std::env::var("OUT_DIR").unwrap();
    let bindings_path = PathBuf::from(out_dir).join("bindings.rs");

    let clang_args = include_paths
        .iter()
        .map(|path| format!("-I{}", path.display()));

    bindgen::builder()
        .header("ffi/wrapper.h")
        .clang_args(clang_args)
        .allowlist_function("sane_.*")
        .allowlist_type("SANE_.*")
        .allowlist_var("SANE_.*")
        .generate()
        .expect("Failed to generate bindings")
        .write_to_file(bindings_path)
        .expect("Failed to write bindings");
}
