// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Content Mutator (C3): turns one resolved [`ContentBlock`] plus its source
//! bytes into a write (or removal) against a single destination path inside
//! the sandbox.
//!
//! Dispatch order follows spec.md §4.3 exactly: a bare `remove` (no
//! insertion marker) deletes the destination wholesale; an insertion marker
//! (`text`/`json`/`yaml`) switches to "mutate the existing destination in
//! place" — in *add* mode when the content's `remove` flag is false, in
//! *remove* mode when it's true — instead of replacing the destination
//! wholesale; `replace = false` on a wholesale write means "leave an
//! existing file alone" (safe re-scaffolding of a directory a user has
//! since edited) and plays no part in the insertion-mode policies.

use crate::error::MutatorError;
use cnc_core::values::json_to_plain_string;
use cnc_core::{ContentBlock, ContentSource, Values};
use cnc_forge::{path, Engine};
use serde_json::Value as Json;
use std::fs;
use std::path::{Path, PathBuf};

/// What happened to the destination as a result of [`mutate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    Removed,
    Written,
    Skipped,
}

fn io_err(path: &Path, source: std::io::Error) -> MutatorError {
    MutatorError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// Whether `relative_path` should be rendered as a template rather than
/// copied byte-for-byte: not matched by `preserve`, and matched by
/// `transform` whenever `transform` is non-empty (an allowlist); with an
/// empty `transform` list, everything not preserved is rendered.
pub fn should_render(block: &ContentBlock, relative_path: &str) -> bool {
    if matches_any(&block.preserve.as_vec(), relative_path) {
        return false;
    }
    let transform = block.transform.as_vec();
    if transform.is_empty() {
        return true;
    }
    matches_any(&transform, relative_path)
}

pub fn matches_any(patterns: &[String], relative_path: &str) -> bool {
    patterns.iter().any(|pattern| {
        glob::Pattern::new(pattern)
            .map(|compiled| compiled.matches(relative_path))
            .unwrap_or(false)
    })
}

/// Render an inline literal value (spec.md §4.3 policy 2): strings render
/// through the template engine; anything else is emitted in its plain form.
fn render_inline(engine: &Engine, value: &Json, values: &Values) -> Result<Vec<u8>, MutatorError> {
    let rendered = engine.render_json(value, values)?;
    Ok(match rendered {
        Json::String(s) => s.into_bytes(),
        other => json_to_plain_string(&other).into_bytes(),
    })
}

fn bytes_to_json_value(bytes: &[u8]) -> Json {
    let text = String::from_utf8_lossy(bytes);
    serde_json::from_str(&text).unwrap_or_else(|_| Json::String(text.into_owned()))
}

fn read_to_string_or_empty(path: &Path) -> Result<String, MutatorError> {
    if !path.exists() {
        return Ok(String::new());
    }
    fs::read_to_string(path).map_err(|e| io_err(path, e))
}

fn read_json_or_default(path: &Path) -> Result<Json, MutatorError> {
    if !path.exists() {
        return Ok(Json::Object(serde_json::Map::new()));
    }
    let contents = fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    serde_json::from_str(&contents).map_err(|e| MutatorError::InvalidJson {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

fn read_yaml_or_default(path: &Path) -> Result<Json, MutatorError> {
    if !path.exists() {
        return Ok(Json::Object(serde_json::Map::new()));
    }
    let contents = fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    serde_yaml::from_str(&contents).map_err(|e| MutatorError::InvalidYaml {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// A rendered `text`/`json`/`yaml` selector: either the literal
/// boolean-true shortcut ("append"/"anywhere", spec.md §4.3 policy 6), or a
/// location string (a `cnc-forge: <L>` marker label for text mode, a
/// `__`-separated path for json/yaml mode).
enum Marker {
    Boolean(bool),
    Location(String),
}

/// Render `raw` and classify it. A string that renders to exactly `"True"`
/// or `"False"` is treated as a literal boolean, matching the same
/// "exactly the string True" convention [`crate::mutator`]'s sibling
/// `condition()` in `cnc_forge::template` uses.
fn resolve_marker(engine: &Engine, raw: &Json, values: &Values) -> Result<Marker, MutatorError> {
    match raw {
        Json::Bool(b) => Ok(Marker::Boolean(*b)),
        Json::String(s) => {
            let rendered = engine.render_str(s, values)?;
            match rendered.as_str() {
                "True" => Ok(Marker::Boolean(true)),
                "False" => Ok(Marker::Boolean(false)),
                _ => Ok(Marker::Location(rendered)),
            }
        }
        other => Ok(Marker::Location(json_to_plain_string(other))),
    }
}

/// json/yaml mode has no boolean-true shortcut (spec.md §4.3 policy 6 only
/// documents it for `text`); a boolean marker there addresses the whole
/// document as the list.
fn marker_location(marker: &Marker) -> String {
    match marker {
        Marker::Boolean(_) => String::new(),
        Marker::Location(s) => s.clone(),
    }
}

fn ensure_map(cursor: &mut Json) -> &mut serde_json::Map<String, Json> {
    if !cursor.is_object() {
        *cursor = Json::Object(serde_json::Map::new());
    }
    match cursor {
        Json::Object(map) => map,
        _ => unreachable!("cursor was just normalized to an object"),
    }
}

fn ensure_list(cursor: &mut Json) -> &mut Vec<Json> {
    if !cursor.is_array() {
        *cursor = Json::Array(Vec::new());
    }
    match cursor {
        Json::Array(list) => list,
        _ => unreachable!("cursor was just normalized to an array"),
    }
}

/// Navigate a `__`-separated path (`"services__api__port"`) inside a JSON
/// document, creating intermediate objects as needed, and return the list
/// living at that path (creating an empty one if absent). An empty path
/// addresses `doc` itself as the list.
fn navigate_list<'a>(doc: &'a mut Json, location: &str) -> &'a mut Vec<Json> {
    let segments: Vec<&str> = location.split("__").filter(|s| !s.is_empty()).collect();
    let mut cursor = doc;
    if let Some((last, parents)) = segments.split_last() {
        for seg in parents {
            let map = ensure_map(cursor);
            cursor = map
                .entry((*seg).to_string())
                .or_insert_with(|| Json::Object(serde_json::Map::new()));
        }
        let map = ensure_map(cursor);
        cursor = map
            .entry((*last).to_string())
            .or_insert_with(|| Json::Array(Vec::new()));
    }
    ensure_list(cursor)
}

/// json/yaml structured merge (spec.md §4.3 policy 6): the node at
/// `location` must be a list; `value` is inserted if absent (add mode,
/// idempotent) or removed if present (remove mode).
fn apply_structured(doc: &mut Json, location: &str, value: Json, remove: bool) {
    let list = navigate_list(doc, location);
    if remove {
        list.retain(|existing| existing != &value);
    } else if !list.contains(&value) {
        list.push(value);
    }
}

/// Remove every occurrence of `needle` from `text`, preferring to also
/// consume a trailing newline so a removed line doesn't leave a blank one
/// behind ("normalizing a trailing newline", spec.md §4.3 policy 6).
fn remove_all_occurrences(text: &str, needle: &str) -> String {
    if needle.is_empty() {
        return text.to_string();
    }
    let with_newline = format!("{needle}\n");
    if text.contains(&with_newline) {
        text.replace(&with_newline, "")
    } else {
        text.replace(needle, "")
    }
}

/// text mode (spec.md §4.3 policy 6): `source_norm` has already had one
/// trailing `\n` stripped. Add mode inserts it on the line preceding the
/// first line containing `cnc-forge: <L>`; remove mode deletes it from the
/// segment preceding that marker. `R = false`/`R = true` is the content's
/// `remove` flag.
fn apply_text(
    existing: &str,
    marker: &Marker,
    source_norm: &str,
    remove: bool,
    destination_display: &str,
) -> Result<String, MutatorError> {
    let not_found = |needle: String| MutatorError::MarkerNotFound {
        path: destination_display.to_string(),
        marker: needle,
    };

    if !remove {
        if existing.contains(source_norm) {
            return Ok(existing.to_string());
        }
        return match marker {
            Marker::Boolean(true) => {
                let mut out = existing.to_string();
                if !out.is_empty() && !out.ends_with('\n') {
                    out.push('\n');
                }
                out.push_str(source_norm);
                out.push('\n');
                Ok(out)
            }
            Marker::Boolean(false) => Ok(existing.to_string()),
            Marker::Location(loc) => {
                let needle = format!("cnc-forge: {loc}");
                let lines: Vec<&str> = existing.lines().collect();
                let Some(idx) = lines.iter().position(|line| line.contains(needle.as_str()))
                else {
                    return Err(not_found(needle));
                };
                let mut new_lines = lines;
                new_lines.insert(idx, source_norm);
                Ok(format!("{}\n", new_lines.join("\n")))
            }
        };
    }

    if !existing.contains(source_norm) {
        return Ok(existing.to_string());
    }
    match marker {
        Marker::Boolean(true) => Ok(remove_all_occurrences(existing, source_norm)),
        Marker::Boolean(false) => Ok(existing.to_string()),
        Marker::Location(loc) => {
            let needle = format!("cnc-forge: {loc}");
            let Some(marker_pos) = existing.find(needle.as_str()) else {
                return Err(not_found(needle));
            };
            let (head, tail) = existing.split_at(marker_pos);
            Ok(format!("{}{}", remove_all_occurrences(head, source_norm), tail))
        }
    }
}

#[cfg(unix)]
fn mirror_permissions(source_path: Option<&Path>, destination: &Path) {
    use std::os::unix::fs::PermissionsExt;
    let Some(source_path) = source_path else { return };
    let Ok(metadata) = fs::metadata(source_path) else {
        return;
    };
    let _ = fs::set_permissions(destination, fs::Permissions::from_mode(metadata.permissions().mode()));
}

#[cfg(not(unix))]
fn mirror_permissions(_source_path: Option<&Path>, _destination: &Path) {}

/// `serde_json::to_string_pretty` uses a 2-space indent; json mode writes
/// back with 4 spaces (spec.md §8 scenario S4).
fn to_pretty_json_4space(doc: &Json) -> String {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    if serde::Serialize::serialize(doc, &mut ser).is_err() {
        return String::new();
    }
    String::from_utf8(buf).unwrap_or_default()
}

fn write_string(path: &Path, contents: &str) -> Result<(), MutatorError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    fs::write(path, contents).map_err(|e| io_err(path, e))
}

/// Everything [`mutate`] needs about one source-to-destination pairing.
pub struct MutateRequest<'a> {
    pub destination_root: &'a Path,
    pub block: &'a ContentBlock,
    pub source_bytes: Option<&'a [u8]>,
    /// Absolute path of the on-disk source file, when there is one — used
    /// only to mirror permission bits onto the destination (spec.md §4.3
    /// policy 7, "unless source was an inline value").
    pub source_path: Option<&'a Path>,
    pub destination_relative: &'a str,
    pub should_render: bool,
    pub values: &'a Values,
}

pub fn mutate(engine: &Engine, req: MutateRequest<'_>) -> Result<MutationOutcome, MutatorError> {
    let destination: PathBuf = path::resolve(req.destination_root, req.destination_relative)?;

    if req.block.remove && !req.block.has_insertion_marker() {
        if destination.is_dir() {
            fs::remove_dir_all(&destination).map_err(|e| io_err(&destination, e))?;
            return Ok(MutationOutcome::Removed);
        }
        if destination.exists() {
            fs::remove_file(&destination).map_err(|e| io_err(&destination, e))?;
            return Ok(MutationOutcome::Removed);
        }
        return Ok(MutationOutcome::Skipped);
    }

    let rendered: Vec<u8> = match (&req.block.source, req.source_bytes) {
        (ContentSource::Inline { value }, _) => render_inline(engine, value, req.values)?,
        (ContentSource::Path(_), Some(bytes)) if req.should_render => {
            let text = String::from_utf8_lossy(bytes).into_owned();
            engine.render_str(&text, req.values)?.into_bytes()
        }
        (ContentSource::Path(_), Some(bytes)) => bytes.to_vec(),
        (ContentSource::Path(_), None) => Vec::new(),
    };

    if let Some(marker_raw) = &req.block.text {
        let marker = resolve_marker(engine, marker_raw, req.values)?;
        let existing = read_to_string_or_empty(&destination)?;
        let source_text = String::from_utf8_lossy(&rendered).into_owned();
        let source_norm = source_text.strip_suffix('\n').unwrap_or(&source_text);
        let destination_display = destination.display().to_string();
        let updated = apply_text(&existing, &marker, source_norm, req.block.remove, &destination_display)?;
        write_string(&destination, &updated)?;
        return Ok(MutationOutcome::Written);
    }

    if let Some(marker_raw) = &req.block.json {
        let marker = resolve_marker(engine, marker_raw, req.values)?;
        let location = marker_location(&marker);
        let mut doc = read_json_or_default(&destination)?;
        apply_structured(&mut doc, &location, bytes_to_json_value(&rendered), req.block.remove);
        let serialized = format!("{}\n", to_pretty_json_4space(&doc));
        write_string(&destination, &serialized)?;
        return Ok(MutationOutcome::Written);
    }

    if let Some(marker_raw) = &req.block.yaml {
        let marker = resolve_marker(engine, marker_raw, req.values)?;
        let location = marker_location(&marker);
        let mut doc = read_yaml_or_default(&destination)?;
        apply_structured(&mut doc, &location, bytes_to_json_value(&rendered), req.block.remove);
        let serialized = serde_yaml::to_string(&doc).unwrap_or_default();
        write_string(&destination, &serialized)?;
        return Ok(MutationOutcome::Written);
    }

    if !req.block.replace && destination.exists() {
        return Ok(MutationOutcome::Skipped);
    }
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    fs::write(&destination, &rendered).map_err(|e| io_err(&destination, e))?;
    mirror_permissions(req.source_path, &destination);
    Ok(MutationOutcome::Written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cnc_core::BlockMeta;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn block(source: ContentSource) -> ContentBlock {
        ContentBlock {
            source,
            destination: None,
            include: Default::default(),
            exclude: Default::default(),
            preserve: Default::default(),
            transform: Default::default(),
            text: None,
            json: None,
            yaml: None,
            replace: true,
            remove: false,
            meta: BlockMeta::default(),
        }
    }

    fn req<'a>(
        dir: &'a Path,
        b: &'a ContentBlock,
        source_bytes: Option<&'a [u8]>,
        destination_relative: &'a str,
        should_render: bool,
        values: &'a Values,
    ) -> MutateRequest<'a> {
        MutateRequest {
            destination_root: dir,
            block: b,
            source_bytes,
            source_path: None,
            destination_relative,
            should_render,
            values,
        }
    }

    #[test]
    fn writes_rendered_source_bytes() {
        let engine = Engine::new();
        let dir = tempdir().unwrap();
        let mut b = block(ContentSource::Path("svc.rs".to_string()));
        b.destination = Some("out/svc.rs".to_string());
        let values: Values = HashMap::from([("name".to_string(), serde_json::json!("widget"))]);
        let outcome = mutate(
            &engine,
            req(dir.path(), &b, Some(b"struct {{ name }};".as_slice()), "out/svc.rs", true, &values),
        )
        .unwrap();
        assert_eq!(outcome, MutationOutcome::Written);
        let written = fs::read_to_string(dir.path().join("out/svc.rs")).unwrap();
        assert_eq!(written, "struct widget;");
    }

    #[test]
    fn replace_false_skips_existing_destination() {
        let engine = Engine::new();
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("out.txt"), "hand-edited").unwrap();
        let mut b = block(ContentSource::Path("out.txt".to_string()));
        b.replace = false;
        let values = Values::new();
        let outcome = mutate(
            &engine,
            req(dir.path(), &b, Some(b"generated".as_slice()), "out.txt", false, &values),
        )
        .unwrap();
        assert_eq!(outcome, MutationOutcome::Skipped);
        assert_eq!(fs::read_to_string(dir.path().join("out.txt")).unwrap(), "hand-edited");
    }

    #[test]
    fn remove_deletes_existing_file_when_no_marker_present() {
        let engine = Engine::new();
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("gone.txt"), "bye").unwrap();
        let mut b = block(ContentSource::Path("gone.txt".to_string()));
        b.remove = true;
        let values = Values::new();
        let outcome = mutate(&engine, req(dir.path(), &b, None, "gone.txt", false, &values)).unwrap();
        assert_eq!(outcome, MutationOutcome::Removed);
        assert!(!dir.path().join("gone.txt").exists());
    }

    /// Scenario S3 (spec.md §8): insertion lands on the line *preceding*
    /// the first line containing the `cnc-forge: <L>` marker.
    #[test]
    fn text_insertion_lands_on_the_line_preceding_the_marker() {
        let engine = Engine::new();
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("routes.rs"),
            "fee\nfie\n  # cnc-forge: here  \nfoe\nfum\n",
        )
        .unwrap();
        let mut b = block(ContentSource::Inline {
            value: Json::String("yep\n".to_string()),
        });
        b.text = Some(Json::String("here".to_string()));
        let values = Values::new();
        mutate(&engine, req(dir.path(), &b, None, "routes.rs", false, &values)).unwrap();
        let written = fs::read_to_string(dir.path().join("routes.rs")).unwrap();
        assert_eq!(written, "fee\nfie\nyep\n  # cnc-forge: here  \nfoe\nfum\n");
    }

    #[test]
    fn text_insertion_is_idempotent() {
        let engine = Engine::new();
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("routes.rs"), "// cnc-forge: marker\nfn main() {}").unwrap();
        let mut b = block(ContentSource::Inline {
            value: Json::String("mod widget;".to_string()),
        });
        b.text = Some(Json::String("marker".to_string()));
        let values = Values::new();
        let one = || req(dir.path(), &b, None, "routes.rs", false, &values);
        mutate(&engine, one()).unwrap();
        let first = fs::read_to_string(dir.path().join("routes.rs")).unwrap();
        mutate(&engine, one()).unwrap();
        let second = fs::read_to_string(dir.path().join("routes.rs")).unwrap();
        assert_eq!(first, second);
        assert!(first.contains("mod widget;"));
    }

    /// Property 4 (spec.md §8): add then remove with identical arguments
    /// restores the original destination.
    #[test]
    fn text_add_then_remove_round_trips() {
        let engine = Engine::new();
        let dir = tempdir().unwrap();
        let original = "fee\nfie\n  # cnc-forge: here  \nfoe\nfum\n";
        fs::write(dir.path().join("routes.rs"), original).unwrap();
        let mut b = block(ContentSource::Inline {
            value: Json::String("yep\n".to_string()),
        });
        b.text = Some(Json::String("here".to_string()));
        let values = Values::new();
        mutate(&engine, req(dir.path(), &b, None, "routes.rs", false, &values)).unwrap();
        assert_ne!(fs::read_to_string(dir.path().join("routes.rs")).unwrap(), original);

        b.remove = true;
        mutate(&engine, req(dir.path(), &b, None, "routes.rs", false, &values)).unwrap();
        assert_eq!(fs::read_to_string(dir.path().join("routes.rs")).unwrap(), original);
    }

    #[test]
    fn text_boolean_true_appends_to_end_of_destination() {
        let engine = Engine::new();
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), "line one\n").unwrap();
        let mut b = block(ContentSource::Inline {
            value: Json::String("line two".to_string()),
        });
        b.text = Some(Json::Bool(true));
        let values = Values::new();
        mutate(&engine, req(dir.path(), &b, None, "notes.txt", false, &values)).unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join("notes.txt")).unwrap(),
            "line one\nline two\n"
        );
    }

    /// Scenario S4 (spec.md §8): the addressed node is a list; inserting
    /// appends the source value, preserving existing members and order.
    #[test]
    fn json_insertion_appends_to_existing_list_in_order() {
        let engine = Engine::new();
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("config.json"),
            r#"{"a":{"b":[{"c":"d"},{"e":"f"}]}}"#,
        )
        .unwrap();
        let mut b = block(ContentSource::Inline {
            value: serde_json::json!({"g": "h"}),
        });
        b.json = Some(Json::String("a__b".to_string()));
        let values = Values::new();
        mutate(&engine, req(dir.path(), &b, None, "config.json", false, &values)).unwrap();
        let contents = fs::read_to_string(dir.path().join("config.json")).unwrap();
        assert!(contents.ends_with('\n'));
        assert!(contents.contains("\n    \"a\""), "expected 4-space indent, got: {contents}");
        let doc: Json = serde_json::from_str(&contents).unwrap();
        assert_eq!(
            doc["a"]["b"],
            serde_json::json!([{"c": "d"}, {"e": "f"}, {"g": "h"}])
        );
    }

    #[test]
    fn json_insertion_creates_nested_path_and_is_idempotent() {
        let engine = Engine::new();
        let dir = tempdir().unwrap();
        let mut b = block(ContentSource::Inline { value: serde_json::json!(6566) });
        b.json = Some(Json::String("services__api__port".to_string()));
        let values = Values::new();
        let one = || req(dir.path(), &b, None, "config.json", false, &values);
        mutate(&engine, one()).unwrap();
        mutate(&engine, one()).unwrap();
        let doc: Json = serde_json::from_str(
            &fs::read_to_string(dir.path().join("config.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(doc["services"]["api"], serde_json::json!([6566]));
    }

    /// Property 4 (spec.md §8): json add then remove restores the original
    /// list contents.
    #[test]
    fn json_add_then_remove_round_trips() {
        let engine = Engine::new();
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("config.json"),
            r#"{"a":{"b":[{"c":"d"}]}}"#,
        )
        .unwrap();
        let mut b = block(ContentSource::Inline {
            value: serde_json::json!({"g": "h"}),
        });
        b.json = Some(Json::String("a__b".to_string()));
        let values = Values::new();
        mutate(&engine, req(dir.path(), &b, None, "config.json", false, &values)).unwrap();
        b.remove = true;
        mutate(&engine, req(dir.path(), &b, None, "config.json", false, &values)).unwrap();
        let doc: Json = serde_json::from_str(
            &fs::read_to_string(dir.path().join("config.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(doc["a"]["b"], serde_json::json!([{"c": "d"}]));
    }

    #[test]
    fn yaml_insertion_appends_to_list_block_style() {
        let engine = Engine::new();
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("config.yaml"), "a:\n  b:\n  - c\n").unwrap();
        let mut b = block(ContentSource::Inline {
            value: Json::String("d".to_string()),
        });
        b.yaml = Some(Json::String("a__b".to_string()));
        let values = Values::new();
        mutate(&engine, req(dir.path(), &b, None, "config.yaml", false, &values)).unwrap();
        let doc: Json =
            serde_yaml::from_str(&fs::read_to_string(dir.path().join("config.yaml")).unwrap()).unwrap();
        assert_eq!(doc["a"]["b"], serde_json::json!(["c", "d"]));
    }

    #[test]
    fn should_render_respects_preserve_over_transform() {
        let mut b = block(ContentSource::Path("logo.png".to_string()));
        b.preserve = cnc_core::StringOrList::Many(vec!["*.png".to_string()]);
        assert!(!should_render(&b, "logo.png"));
        assert!(should_render(&b, "main.rs"));
    }
}
