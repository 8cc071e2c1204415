// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Content Walker (C4): expands a [`ContentBlock`]'s `source` — a single
//! file, a directory tree, or an inline value — into the list of concrete
//! (source, destination) pairs the mutator writes, then drives the mutator
//! over each of them (`craft`).

use crate::error::WalkerError;
use crate::mutator::{self, should_render, MutateRequest, MutationOutcome};
use cnc_core::{ContentBlock, ContentSource, Values};
use cnc_forge::{path, Engine};
use std::fs;
use std::path::Path;

/// One resolved source/destination pairing, both relative to the sandbox root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkedFile {
    pub relative_source: String,
    pub relative_destination: String,
}

fn io_err(path: &Path, source: std::io::Error) -> WalkerError {
    WalkerError::Io {
        path: path.display().to_string(),
        source,
    }
}

fn render_relative(engine: &Engine, template: &str, values: &Values) -> Result<String, WalkerError> {
    Ok(engine.render_str(template, values)?)
}

/// Policy 1 (spec.md §4.3): skip a candidate only when *no* `include`
/// pattern matches it *and* some `exclude` pattern does. `include` is not
/// an allowlist on its own — it's an override that protects a path from an
/// otherwise-matching `exclude`, matching the original `cnc.py: exclude()`.
fn excluded(include: &[String], exclude: &[String], candidate: &str) -> bool {
    !mutator::matches_any(include, candidate) && mutator::matches_any(exclude, candidate)
}

/// Expand `block.source` into every (source, destination) pair it names.
///
/// `source_root` and `destination_root` are separate trees: a Change block's
/// own `github:` target clones the template source into a different sandbox
/// than the enclosing Code block's destination checkout (spec.md §4.5
/// `change()`). Only `source_root` is consulted here; the returned paths stay
/// relative until the mutator resolves them against whichever root applies.
pub fn walk(
    engine: &Engine,
    source_root: &Path,
    block: &ContentBlock,
    values: &Values,
) -> Result<Vec<WalkedFile>, WalkerError> {
    let ContentSource::Path(source_template) = &block.source else {
        let destination_template = block.destination.as_deref().unwrap_or_default();
        let relative_destination = render_relative(engine, destination_template, values)?;
        return Ok(vec![WalkedFile {
            relative_source: String::new(),
            relative_destination,
        }]);
    };

    let relative_source_root = render_relative(engine, source_template, values)?;
    let resolved_source_root = path::resolve(source_root, &relative_source_root)?;
    let destination_base = block
        .destination
        .clone()
        .unwrap_or_else(|| relative_source_root.clone());

    let include = block.include.as_vec();
    let exclude = block.exclude.as_vec();

    if resolved_source_root.is_file() || !resolved_source_root.exists() {
        if excluded(&include, &exclude, &relative_source_root) {
            return Ok(Vec::new());
        }
        let relative_destination = render_relative(engine, &destination_base, values)?;
        return Ok(vec![WalkedFile {
            relative_source: relative_source_root,
            relative_destination,
        }]);
    }

    let pattern = format!("{}/**/*", resolved_source_root.display());
    let mut out = Vec::new();
    for entry in glob::glob(&pattern).map_err(|e| WalkerError::InvalidPattern {
        pattern: pattern.clone(),
        message: e.to_string(),
    })? {
        let entry_path = entry.map_err(|e| io_err(&resolved_source_root, e.into_error()))?;
        if entry_path.is_dir() {
            continue;
        }
        let relative = entry_path
            .strip_prefix(&resolved_source_root)
            .unwrap_or(&entry_path)
            .to_string_lossy()
            .replace('\\', "/");

        // A directory's own `.git` tree is never a recipe source, even when
        // the whole repo checkout is (spec.md §4.4 step 3).
        if relative.split('/').any(|segment| segment == ".git") {
            continue;
        }

        if excluded(&include, &exclude, &relative) {
            continue;
        }

        let relative_source = format!("{relative_source_root}/{relative}");
        let destination_template = format!("{destination_base}/{relative}");
        let relative_destination = render_relative(engine, &destination_template, values)?;
        out.push(WalkedFile {
            relative_source,
            relative_destination,
        });
    }
    Ok(out)
}

/// Walk `block` and mutate every resulting destination, in walk order.
///
/// `source_root` and `destination_root` may be the same tree (the common
/// case — a Change block with no `github:` of its own reads and writes the
/// same checkout) or two independently cloned sandboxes.
pub fn craft(
    engine: &Engine,
    source_root: &Path,
    destination_root: &Path,
    block: &ContentBlock,
    values: &Values,
) -> Result<Vec<MutationOutcome>, WalkerError> {
    let files = walk(engine, source_root, block, values)?;
    let mut outcomes = Vec::with_capacity(files.len());
    for file in &files {
        let absolute_source = if block.source.is_inline() {
            None
        } else {
            Some(path::resolve(source_root, &file.relative_source)?)
        };
        let source_bytes = match &absolute_source {
            None => None,
            Some(absolute_source) => Some(fs::read(absolute_source).map_err(|e| io_err(absolute_source, e))?),
        };
        let render = should_render(block, &file.relative_source);
        let outcome = mutator::mutate(
            engine,
            MutateRequest {
                destination_root,
                block,
                source_bytes: source_bytes.as_deref(),
                source_path: absolute_source.as_deref(),
                destination_relative: &file.relative_destination,
                should_render: render,
                values,
            },
        )?;
        outcomes.push(outcome);
    }
    Ok(outcomes)
}
