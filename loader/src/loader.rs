//! Directory loading of prompt files.
//!
//! [`load_prompt_dir`] reads every prompt file (`*.yaml`, `*.yml`,
//! `*.prompt`) in a directory, in path order, so that seeding a store from
//! the same directory twice performs the same sequence of writes.
//!
//! ```no_run
//! use promptdb_loader::load_prompt_dir;
//!
//! for prompt in load_prompt_dir("prompts/").unwrap() {
//!     println!("{} <- {}", prompt.definition.name(), prompt.path.display());
//! }
//! ```

use std::path::{Path, PathBuf};

use promptdb_core::PromptDefinition;
use tracing::debug;

use crate::error::Result;
use crate::prompt_file::PromptFile;

/// File extensions recognized as prompt files.
pub const PROMPT_EXTENSIONS: &[&str] = &["yaml", "yml", "prompt"];

/// A definition together with the file it was read from.
#[derive(Debug, Clone)]
pub struct LoadedPrompt {
    pub path: PathBuf,
    pub definition: PromptDefinition,
}

/// Reads a single prompt file into a [`PromptDefinition`].
///
/// # Errors
///
/// See [`PromptFile::from_path`].
pub fn load_definition(path: impl AsRef<Path>) -> Result<PromptDefinition> {
    Ok(PromptFile::from_path(path)?.into_definition())
}

/// Loads every prompt file in `dir`, sorted by path.
///
/// Subdirectories and files with other extensions are skipped.
///
/// # Errors
///
/// Returns [`IoError`](crate::LoaderError::IoError) if the directory cannot
/// be read, or the first parse error encountered.
pub fn load_prompt_dir(dir: impl AsRef<Path>) -> Result<Vec<LoadedPrompt>> {
    let dir = dir.as_ref();
    let mut paths = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_prompt_file(&path) {
            paths.push(path);
        }
    }
    paths.sort();

    let mut prompts = Vec::with_capacity(paths.len());
    for path in paths {
        let definition = load_definition(&path)?;
        debug!(path = %path.display(), name = definition.name(), "loaded prompt file");
        prompts.push(LoadedPrompt { path, definition });
    }
    Ok(prompts)
}

fn is_prompt_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| PROMPT_EXTENSIONS.contains(&ext))
}
