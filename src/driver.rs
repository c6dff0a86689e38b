// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Batch compilation: source in, module file out.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// What a batch compile should produce.
#[derive(Debug, Clone, Copy)]
pub struct BuildOptions<'a> {
    /// Where the module bytes are written
    pub output: &'a Path,
    /// Also return a disassembly listing
    pub disasm: bool,
}

/// Reads a source file.
pub fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read '{}'", path.display()))
}

/// Compiles `source`, writes the module, and returns the listing if asked for.
pub fn build(source: &str, options: BuildOptions<'_>) -> Result<Option<String>> {
    let module = yasl_compiler::compile_source(source)?;
    debug!(bytes = module.len(), "compiled module");

    fs::write(options.output, &module)
        .with_context(|| format!("failed to write '{}'", options.output.display()))?;
    info!(path = %options.output.display(), "wrote module");

    if options.disasm {
        return Ok(Some(yasl_compiler::disassemble(&module)?));
    }
    Ok(None)
}

/// Compiles the file at `input`.
pub fn build_file(input: &Path, options: BuildOptions<'_>) -> Result<Option<String>> {
    let source = read_source(input)?;
    build(&source, options).with_context(|| format!("in '{}'", input.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_build_file_writes_module() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("main.yasl");
        let output = dir.path().join("out.yb");
        fs::write(&input, "let x = 2\nif x > 1 { print x }\n").unwrap();

        let listing = build_file(
            &input,
            BuildOptions {
                output: &output,
                disasm: false,
            },
        )
        .unwrap();
        assert!(listing.is_none());

        let module = fs::read(&output).unwrap();
        assert_eq!(module, yasl_compiler::compile_source("let x = 2\nif x > 1 { print x }").unwrap());
    }

    #[test]
    fn test_build_with_disasm() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("out.yb");
        let listing = build(
            "print 1",
            BuildOptions {
                output: &output,
                disasm: true,
            },
        )
        .unwrap()
        .unwrap();
        assert!(listing.contains("ICONST_1"));
        assert!(listing.contains("PRINT"));
        assert!(output.exists());
    }

    #[test]
    fn test_compile_error_writes_nothing() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("out.yb");
        let err = build(
            "print missing",
            BuildOptions {
                output: &output,
                disasm: false,
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("undeclared variable"));
        assert!(!output.exists());
    }

    #[test]
    fn test_missing_input() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("out.yb");
        let err = build_file(
            &dir.path().join("nope.yasl"),
            BuildOptions {
                output: &output,
                disasm: false,
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }
}
