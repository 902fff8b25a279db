//! External EPUB compiler invocation.
//!
//! The assembled Markdown document is handed to a document converter
//! (pandoc by default) which writes the EPUB.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use tracing::{debug, info, instrument, warn};

use econpub_shared::{CompilerConfig, EconpubError, EditionPaths, Result};

/// Arguments passed to the compiler for an edition.
///
/// `-o <epub> <markdown> [--toc=true] --resource-path=<markdown dir> [extra...]`.
/// Image references in the document are relative to the Markdown directory,
/// so that is where the compiler resolves them from.
pub fn compiler_args(paths: &EditionPaths, compiler: &CompilerConfig) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "-o".into(),
        paths.epub_file().into_os_string(),
        paths.markdown_file().into_os_string(),
    ];
    if compiler.toc {
        args.push("--toc=true".into());
    }

    let mut resource_path = OsString::from("--resource-path=");
    resource_path.push(paths.markdown_dir());
    args.push(resource_path);

    args.extend(compiler.extra_args.iter().map(OsString::from));
    args
}

/// Compile the edition's Markdown document into an EPUB.
///
/// Fails with a validation error when the document has not been assembled
/// yet. Returns the EPUB path.
#[instrument(skip_all, fields(edition = %paths.edition(), program = %compiler.program))]
pub fn create_epub(paths: &EditionPaths, compiler: &CompilerConfig) -> Result<PathBuf> {
    let markdown = paths.markdown_file();
    if !markdown.is_file() {
        return Err(EconpubError::validation(format!(
            "markdown document not found: {}",
            markdown.display()
        )));
    }

    let epub_dir = paths.epub_dir();
    std::fs::create_dir_all(&epub_dir).map_err(|e| EconpubError::io(&epub_dir, e))?;

    let args = compiler_args(paths, compiler);
    debug!(?args, "running compiler");

    let output = Command::new(&compiler.program)
        .args(&args)
        .stdin(Stdio::null())
        .output()
        .map_err(|source| EconpubError::CompilerSpawn {
            program: compiler.program.clone(),
            source,
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        warn!(stderr = %stderr.trim(), "compiler failed");
        return Err(EconpubError::Compiler {
            program: compiler.program.clone(),
            status: output.status.code().unwrap_or(-1),
        });
    }

    let epub = paths.epub_file();
    info!(path = %epub.display(), "epub written");
    Ok(epub)
}
