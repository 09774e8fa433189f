use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=src/api.rs");

    let out_dir = PathBuf::from(std::env::var_os("OUT_DIR").expect("OUT_DIR is set by cargo"));
    if let Err(error) = apigen::generate_file("src/api.rs", out_dir.join("api_handlers.rs")) {
        panic!("{error}");
    }
}
