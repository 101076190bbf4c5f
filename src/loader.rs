//! This module provides the `AutomatonLoader` struct, responsible for loading machine
//! descriptors from files, directories and strings.

use crate::automaton::{Automaton, MachineKind};
use crate::parser::parse;
use crate::types::GrammarError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// `AutomatonLoader` is a utility struct for loading machine descriptors.
///
/// Descriptors ending in `.tm` hold Turing machines, descriptors ending in `.lba` hold
/// linear bounded automata.
pub struct AutomatonLoader;

impl AutomatonLoader {
    /// Loads a single descriptor of the given kind from the specified file path.
    ///
    /// # Returns
    ///
    /// * `Ok(Automaton)` if the file is successfully read, parsed and validated.
    /// * `Err(GrammarError::FileError)` if the file cannot be read.
    /// * `Err(GrammarError::ParseError)` or `Err(GrammarError::ValidationError)` if the
    ///   content is not a valid descriptor.
    pub fn load(path: &Path, kind: MachineKind) -> Result<Automaton, GrammarError> {
        let content = fs::read_to_string(path).map_err(|e| {
            GrammarError::FileError(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        let automaton = parse(&content, kind)?;
        debug!(path = %path.display(), kind = %kind, "Loaded descriptor");

        Ok(automaton)
    }

    /// Loads a descriptor, inferring its kind from the file extension.
    pub fn load_by_extension(path: &Path) -> Result<Automaton, GrammarError> {
        let kind = Self::kind_of(path).ok_or_else(|| {
            GrammarError::FileError(format!(
                "Cannot tell the machine kind of {}, expected a .tm or .lba file",
                path.display()
            ))
        })?;

        Self::load(path, kind)
    }

    /// Parses a descriptor held in memory.
    pub fn load_from_string(content: &str, kind: MachineKind) -> Result<Automaton, GrammarError> {
        parse(content, kind)
    }

    /// Loads every `.tm` and `.lba` descriptor found directly in `directory`.
    ///
    /// Other files and subdirectories are skipped. Each descriptor yields its own result, so
    /// one broken file does not hide the others.
    pub fn load_directory(
        directory: &Path,
    ) -> Vec<Result<(PathBuf, Automaton), GrammarError>> {
        if !directory.exists() {
            return vec![Err(GrammarError::FileError(format!(
                "Directory {} does not exist",
                directory.display()
            )))];
        }

        let entries = match fs::read_dir(directory) {
            Ok(entries) => entries,
            Err(e) => {
                return vec![Err(GrammarError::FileError(format!(
                    "Failed to read directory {}: {}",
                    directory.display(),
                    e
                )))]
            }
        };

        let mut paths: Vec<PathBuf> = Vec::new();
        let mut results = Vec::new();
        for entry in entries {
            match entry {
                Ok(entry) => paths.push(entry.path()),
                Err(e) => results.push(Err(GrammarError::FileError(format!(
                    "Failed to read directory entry: {}",
                    e
                )))),
            }
        }
        paths.sort();

        results.extend(
            paths
                .into_iter()
                .filter(|path| !path.is_dir() && Self::kind_of(path).is_some())
                .map(|path| match Self::load_by_extension(&path) {
                    Ok(automaton) => Ok((path, automaton)),
                    Err(e) => Err(GrammarError::FileError(format!(
                        "Failed to load descriptor from {}: {}",
                        path.display(),
                        e
                    ))),
                }),
        );

        results
    }

    fn kind_of(path: &Path) -> Option<MachineKind> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(MachineKind::from_extension)
    }
}
