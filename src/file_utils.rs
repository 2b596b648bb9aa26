use anyhow::{Context, Result, anyhow};
use log::{error, info};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::markup;

// @module: File and directory utilities

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path).with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }

    /// Find files with a specific extension in a directory, sorted by path
    pub fn find_files<P: AsRef<Path>>(dir: P, extension: &str) -> Result<Vec<PathBuf>> {
        let extension = extension.trim_start_matches('.');
        let mut result = Vec::new();

        for entry in WalkDir::new(dir.as_ref()).follow_links(true).sort_by_file_name() {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if path.is_file() && has_extension(path, extension) {
                result.push(path.to_path_buf());
            }
        }

        Ok(result)
    }

    /// Path of `file` (somewhere below `input_root`) mirrored below `output_root`
    pub fn mirror_path(input_root: &Path, file: &Path, output_root: &Path) -> Result<PathBuf> {
        let relative = file
            .strip_prefix(input_root)
            .with_context(|| format!("{:?} is not inside {:?}", file, input_root))?;
        Ok(output_root.join(relative))
    }

    /// Read a file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        fs::read_to_string(&path).with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Write a string to a file
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        // Ensure the parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        fs::write(&path, content).with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))?;
        Ok(())
    }

    /// Copy a file from one location to another, ensuring the target directory exists
    pub fn copy_file<P1: AsRef<Path>, P2: AsRef<Path>>(from: P1, to: P2) -> Result<()> {
        let from = from.as_ref();
        let to = to.as_ref();

        if !from.exists() {
            return Err(anyhow!("Source file does not exist: {:?}", from));
        }

        if let Some(parent) = to.parent() {
            Self::ensure_dir(parent)?;
        }

        fs::copy(from, to).with_context(|| format!("Failed to copy {:?} to {:?}", from, to))?;
        Ok(())
    }
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case(extension))
}

/// Outcome counts of a directory merge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Files copied because the output had no counterpart
    pub copied: usize,
    /// Files merged into an existing counterpart
    pub merged: usize,
    /// Files that could not be processed
    pub failed: usize,
}

/// Merge `input` into the existing `output` file; input wins on conflicts
pub fn merge_file(input: &Path, output: &Path) -> Result<()> {
    let input_tree = markup::deserialize(&FileManager::read_to_string(input)?)
        .with_context(|| format!("Failed to parse {:?}", input))?;
    let output_tree = markup::deserialize(&FileManager::read_to_string(output)?)
        .with_context(|| format!("Failed to parse {:?}", output))?;

    let merged = markup::merge(&input_tree, &output_tree);
    FileManager::write_to_file(output, &markup::serialize(&merged))
}

/// Mirror `input_dir` into `output_dir`, merging `.txt` files that exist on both sides
///
/// Every directory of the input tree is created in the output tree. A `.txt`
/// file with a counterpart is merged into it, one without is copied. Failures
/// are logged and counted; the walk always runs to completion.
pub fn merge_directories(input_dir: &Path, output_dir: &Path) -> Result<MergeReport> {
    if !FileManager::dir_exists(input_dir) {
        return Err(anyhow!("Input directory not found at '{}'", input_dir.display()));
    }

    let mut report = MergeReport::default();

    for entry in WalkDir::new(input_dir).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                error!("Failed to read directory entry: {}", e);
                report.failed += 1;
                continue;
            }
        };

        let target = FileManager::mirror_path(input_dir, entry.path(), output_dir)?;

        if entry.file_type().is_dir() {
            FileManager::ensure_dir(&target)?;
            continue;
        }
        if !entry.file_type().is_file() || !has_extension(entry.path(), "txt") {
            continue;
        }

        let result = if target.exists() {
            info!("Merging '{}' into '{}'...", entry.path().display(), target.display());
            merge_file(entry.path(), &target).map(|_| report.merged += 1)
        } else {
            info!("Copying '{}' to '{}'...", entry.path().display(), target.display());
            FileManager::copy_file(entry.path(), &target).map(|_| report.copied += 1)
        };

        if let Err(e) = result {
            error!("Error merging file {}: {:#}", entry.path().display(), e);
            report.failed += 1;
        }
    }

    Ok(report)
}
