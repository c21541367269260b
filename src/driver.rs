//! Compiling source files to target files.
//!
//! One [Driver] compiles any number of files in sequence through a single [Compiler],
//! so macros defined by one file are visible to the files after it.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::compiler::Compiler;
use crate::error::CompileError;
use crate::reader::TextReader;

pub const SOURCE_SUFFIX: &str = ".lisp";
pub const TARGET_SUFFIX: &str = ".js";

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("{}: cannot access input: {error}", .path.display())]
    Inaccessible { path: PathBuf, error: io::Error },

    #[error("{}: not a regular file", .path.display())]
    NotAFile { path: PathBuf },

    #[error("{}: {error}", .path.display())]
    Io { path: PathBuf, error: io::Error },

    #[error("{}: {error}", .path.display())]
    Compile { path: PathBuf, error: CompileError },
}

/// Where the compiled form of `input` is written:
/// the source suffix (if any) is replaced by the target suffix.
pub fn output_path(input: &Path) -> PathBuf {
    let mut name: OsString = input
        .to_str()
        .and_then(|s| s.strip_suffix(SOURCE_SUFFIX))
        .map(OsString::from)
        .unwrap_or_else(|| input.as_os_str().to_owned());
    name.push(TARGET_SUFFIX);
    PathBuf::from(name)
}

/// Check that every input is a readable regular file.
///
/// All inputs are checked before any of them is compiled.
pub fn check_inputs<P: AsRef<Path>>(inputs: &[P]) -> Result<(), DriverError> {
    for input in inputs {
        let path = input.as_ref();
        let inaccessible = |error| DriverError::Inaccessible {
            path: path.to_owned(),
            error,
        };
        let metadata = fs::metadata(path).map_err(inaccessible)?;
        if !metadata.is_file() {
            return Err(DriverError::NotAFile {
                path: path.to_owned(),
            });
        }
        File::open(path).map_err(inaccessible)?;
    }
    Ok(())
}

/// The result of compiling one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub output: PathBuf,
    /// Length of the written text, in bytes.
    pub bytes: usize,
}

#[derive(Default)]
pub struct Driver {
    compiler: Compiler,
}

impl Driver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compiler(&self) -> &Compiler {
        &self.compiler
    }

    /// Compile `input` and write the result next to it.
    ///
    /// Any existing output file is removed first, so a failed compile leaves no output.
    pub fn compile_file(&mut self, input: &Path) -> Result<Report, DriverError> {
        let output = output_path(input);
        if let Err(e) = fs::remove_file(&output) {
            debug!("not removing {}: {e}", output.display());
        }

        let text = fs::read_to_string(input).map_err(|error| DriverError::Io {
            path: input.to_owned(),
            error,
        })?;
        self.compiler.set_reader(TextReader::new(text));
        let compiled = self
            .compiler
            .compile_all()
            .map_err(|error| DriverError::Compile {
                path: input.to_owned(),
                error,
            })?;

        fs::write(&output, &compiled).map_err(|error| DriverError::Io {
            path: output.clone(),
            error,
        })?;
        info!(
            "compiled {} to {} ({} bytes)",
            input.display(),
            output.display(),
            compiled.len()
        );
        Ok(Report {
            output,
            bytes: compiled.len(),
        })
    }
}
