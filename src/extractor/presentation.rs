//! `.pptx` extraction straight from the OOXML package (zip + quick-xml).

use super::collapse_whitespace;
use anyhow::{anyhow, Context, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use zip::ZipArchive;

const PRESENTATION_PART: &str = "ppt/presentation.xml";
const PRESENTATION_RELS: &str = "ppt/_rels/presentation.xml.rels";

pub fn extract(path: &Path) -> Result<String> {
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    let mut archive =
        ZipArchive::new(BufReader::new(file)).context("not a valid PPTX package")?;
    extract_from_archive(&mut archive)
}

/// One `=== Slide N ===` section per slide in presentation order, followed by
/// one line per text-bearing shape.
pub fn extract_from_archive<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<String> {
    let slide_parts = slide_parts(archive)?;

    let mut text = String::new();
    for (idx, part) in slide_parts.iter().enumerate() {
        text.push_str(&format!("\n=== Slide {} ===\n", idx + 1));

        let xml = read_part(archive, part)?;
        for shape_text in shape_texts(&xml).with_context(|| format!("in {part}"))? {
            text.push_str(&shape_text);
            text.push('\n');
        }
    }

    Ok(text)
}

/// Slide part names in the order `presentation.xml` lists them.
fn slide_parts<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<Vec<String>> {
    let presentation = read_part(archive, PRESENTATION_PART)?;
    let relationship_ids = slide_relationship_ids(&presentation)?;

    let targets = match read_part(archive, PRESENTATION_RELS) {
        Ok(rels) => relationship_targets(&rels)?,
        Err(_) => HashMap::new(),
    };

    Ok(relationship_ids
        .iter()
        .enumerate()
        .map(|(idx, r_id)| match targets.get(r_id) {
            Some(target) => resolve_target(target),
            None => format!("ppt/slides/slide{}.xml", idx + 1),
        })
        .collect())
}

fn slide_relationship_ids(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    let mut ids = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Empty(e)) | Ok(Event::Start(e)) => {
                if e.local_name().as_ref() == b"sldId" {
                    if let Some(r_id) = prefixed_attribute(&e, b"id") {
                        ids.push(r_id);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(anyhow!("malformed presentation.xml: {e}")),
            _ => {}
        }
    }

    Ok(ids)
}

fn relationship_targets(xml: &str) -> Result<HashMap<String, String>> {
    let mut reader = Reader::from_str(xml);
    let mut targets = HashMap::new();

    loop {
        match reader.read_event() {
            Ok(Event::Empty(e)) | Ok(Event::Start(e)) => {
                if e.local_name().as_ref() == b"Relationship" {
                    let mut id = None;
                    let mut target = None;
                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"Id" => id = std::str::from_utf8(&attr.value).ok().map(String::from),
                            b"Target" => {
                                target = std::str::from_utf8(&attr.value).ok().map(String::from)
                            }
                            _ => {}
                        }
                    }
                    if let (Some(id), Some(target)) = (id, target) {
                        targets.insert(id, target);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(anyhow!("malformed presentation relationships: {e}")),
            _ => {}
        }
    }

    Ok(targets)
}

/// The `r:id` style attribute: namespaced, with the given local name.
fn prefixed_attribute(element: &BytesStart<'_>, local: &[u8]) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|attr| attr.key.prefix().is_some() && attr.key.local_name().as_ref() == local)
        .and_then(|attr| std::str::from_utf8(&attr.value).ok().map(String::from))
}

fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("ppt/{}", target.trim_start_matches("./")),
    }
}

fn read_part<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<String> {
    let mut part = archive
        .by_name(name)
        .with_context(|| format!("missing part {name}"))?;
    let mut content = String::new();
    part.read_to_string(&mut content)
        .with_context(|| format!("cannot read part {name}"))?;
    Ok(content)
}

/// Text of every top-level `p:sp` shape, whitespace-collapsed; empty shapes are skipped.
fn shape_texts(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);

    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut shapes = Vec::new();
    let mut current: Option<String> = None;
    let mut shape_depth = 0;
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.local_name().as_ref().to_vec();
                if current.is_none()
                    && name == b"sp"
                    && stack.last().is_some_and(|parent| parent == b"spTree")
                {
                    current = Some(String::new());
                    shape_depth = stack.len();
                }
                if name == b"t" && current.is_some() {
                    in_text = true;
                }
                stack.push(name);
            }
            Ok(Event::Empty(e)) => {
                if let Some(buf) = current.as_mut() {
                    if e.local_name().as_ref() == b"br" {
                        buf.push('\n');
                    }
                }
            }
            Ok(Event::Text(e)) => {
                if in_text {
                    if let Some(buf) = current.as_mut() {
                        let raw = std::str::from_utf8(e.as_ref())?;
                        buf.push_str(&unescape_xml(raw));
                    }
                }
            }
            Ok(Event::CData(e)) => {
                if in_text {
                    if let Some(buf) = current.as_mut() {
                        buf.push_str(std::str::from_utf8(e.as_ref())?);
                    }
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if in_text {
                    if let Some(buf) = current.as_mut() {
                        let entity = std::str::from_utf8(e.as_ref())?;
                        if let Some(ch) = resolve_entity(entity) {
                            buf.push(ch);
                        }
                    }
                }
            }
            Ok(Event::End(_)) => {
                let name = stack.pop().unwrap_or_default();
                if name == b"t" {
                    in_text = false;
                } else if name == b"p" {
                    if let Some(buf) = current.as_mut() {
                        buf.push('\n');
                    }
                } else if name == b"sp" && stack.len() == shape_depth {
                    if let Some(buf) = current.take() {
                        let collapsed = collapse_whitespace(&buf);
                        if !collapsed.is_empty() {
                            shapes.push(collapsed);
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(anyhow!("malformed slide XML: {e}")),
            _ => {}
        }
    }

    Ok(shapes)
}

fn resolve_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let code = name.strip_prefix('#')?;
            let value = match code.strip_prefix('x').or_else(|| code.strip_prefix('X')) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse().ok()?,
            };
            char::from_u32(value)
        }
    }
}

/// Resolves entities left inline in a text run.
fn unescape_xml(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 1..];
        match tail.find(';').and_then(|end| resolve_entity(&tail[..end]).map(|c| (c, end))) {
            Some((ch, end)) => {
                out.push(ch);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}
