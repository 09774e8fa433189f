//! apigen: HTTP dispatch layers generated from annotated Rust source.
//!
//! The pipeline runs leaves first:
//! [`ingest`] → [`annotation`] → [`lower`] → [`rules`] → [`codegen`].
//!
//! Build scripts usually only need [`generate_file`]:
//!
//! ```no_run
//! let out = std::path::Path::new(&std::env::var("OUT_DIR").unwrap()).join("api_handlers.rs");
//! apigen::generate_file("src/api.rs", &out).unwrap();
//! ```
use std::path::Path;

pub mod annotation;
pub mod cli;
pub mod codegen;
pub mod error;
pub mod ingest;
pub mod ir;
pub mod lower;
pub mod rules;

pub use error::{GenError, Location};
pub use ir::Ir;

/// Parses `source` and returns its linked IR.
pub fn build_ir(source: &str, file_label: &str, module: &str) -> Result<Ir, GenError> {
    let decls = ingest::ingest(source, file_label)?;
    lower::lower_to_ir(module, decls)
}

/// Parses `source` and returns the generated module text.
pub fn generate_source(source: &str, file_label: &str, module: &str) -> Result<String, GenError> {
    let ir = build_ir(source, file_label, module)?;
    codegen::render(&ir, file_label)
}

/// Reads `input`, writes the generated module to `output` (creating parent
/// directories) and returns the IR it was generated from.
pub fn generate_file(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Result<Ir, GenError> {
    let (input, output) = (input.as_ref(), output.as_ref());
    let source = std::fs::read_to_string(input).map_err(|error| GenError::Read {
        path: input.to_path_buf(),
        error,
    })?;
    let file_label = input.to_string_lossy();
    let module = module_name(input);

    let ir = build_ir(&source, &file_label, &module)?;
    let generated = codegen::render(&ir, &file_label)?;

    let write_error = |error| GenError::Write { path: output.to_path_buf(), error };
    if let Some(parent) = output.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_error)?;
    }
    std::fs::write(output, generated).map_err(write_error)?;

    tracing::info!(
        input = %input.display(),
        output = %output.display(),
        handlers = ir.methods.len(),
        "generated dispatch layer"
    );
    Ok(ir)
}

/// Module name implied by a source path: the file stem, the parent directory
/// for `mod.rs`, and `crate` for `main.rs`/`lib.rs`.
pub fn module_name(path: &Path) -> String {
    let stem = path.file_stem().map(|stem| stem.to_string_lossy().into_owned()).unwrap_or_default();
    match stem.as_str() {
        "mod" => path
            .parent()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or(stem),
        "main" | "lib" => "crate".to_string(),
        _ => stem,
    }
}
