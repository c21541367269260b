//! Compile Liscript files to JavaScript.
//!
//! ```ignore
//! liscript lib.lisp main.lisp
//! ```
//!
//! Each `name.lisp` is compiled to `name.js`, in order, sharing macro definitions.
//! The first error stops the run.

use std::path::PathBuf;

use anyhow::bail;
use liscript::driver::{self, Driver};

const USAGE: &str = "usage: liscript <file.lisp>...";

fn main() -> anyhow::Result<()> {
    // Standard output carries the per-file reports.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(tracing::Level::WARN)
        .init();

    let inputs = pico_args::Arguments::from_env()
        .finish()
        .into_iter()
        .map(|arg| {
            if arg.to_str().is_some_and(|s| s.starts_with("--")) {
                bail!("unexpected option {}\n{USAGE}", arg.to_string_lossy());
            }
            Ok(PathBuf::from(arg))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    if inputs.is_empty() {
        eprintln!("{USAGE}");
        std::process::exit(1);
    }

    driver::check_inputs(&inputs)?;
    let mut driver = Driver::new();
    for input in &inputs {
        let report = driver.compile_file(input)?;
        println!("{}: {} bytes", report.output.display(), report.bytes);
    }
    Ok(())
}
