//! Minimal CLI: annotated source → generated dispatch module
use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// generate an HTTP dispatch layer from annotated request records and handler methods
#[derive(Parser, Debug)]
#[command(name = "apigen", version)]
pub struct CommandLineInterface {
    /// annotated Rust source file
    input: PathBuf,

    /// generated .rs file (parent directories are created)
    output: PathBuf,

    /// also print the linked IR as pretty JSON to stdout
    #[arg(long)]
    dump_ir: bool,

    /// log verbosity on stderr
    #[arg(long, default_value_t = tracing::Level::WARN)]
    log_level: tracing::Level,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn log_level(&self) -> tracing::Level {
        self.log_level
    }

    pub fn run(&self) -> anyhow::Result<()> {
        // debug path
        if self.no_op {
            eprintln!("{self:#?}");
            return Ok(());
        }

        let ir = crate::generate_file(&self.input, &self.output).with_context(|| {
            format!("failed to generate {} from {}", self.output.display(), self.input.display())
        })?;

        if self.dump_ir {
            let dump = serde_json::to_string_pretty(&ir).context("failed to serialize IR")?;
            println!("{dump}");
        }
        Ok(())
    }
}
