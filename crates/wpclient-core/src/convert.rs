//! Conversion of fetched pathways into the local document model.
//!
//! The local model keeps the GPML text verbatim (that is what the cache stores and the host
//! opens) and extracts the data nodes the highlighter needs: label, graph id, cross
//! reference and bounds. Both the 2013 (`GraphId`, `Database`/`ID`, `CenterX`) and the 2021
//! (`elementId`, `dataSource`/`identifier`, `centerX`) attribute spellings are accepted.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

use crate::model::{DataNode, LocalDocumentModel, ReferenceKey, Region, RemoteDocument};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    #[error("empty pathway payload")]
    Empty,

    #[error("payload has no <Pathway> root element")]
    MissingRoot,

    #[error("GPML pattern failed to compile: {0}")]
    Pattern(String),

    #[error("data node {node:?}: attribute {attr} is not a number: {value:?}")]
    BadNumber {
        node: String,
        attr: &'static str,
        value: String,
    },
}

/// Turns a fetched `RemoteDocument` into a `LocalDocumentModel`.
pub trait DocumentConverter: Send + Sync {
    fn convert(&self, remote: &RemoteDocument) -> Result<LocalDocumentModel, ConversionError>;
}

/// Default converter for GPML payloads.
#[derive(Debug, Default, Clone, Copy)]
pub struct GpmlConverter;

impl DocumentConverter for GpmlConverter {
    fn convert(&self, remote: &RemoteDocument) -> Result<LocalDocumentModel, ConversionError> {
        let mut model = parse_gpml(&remote.gpml)?;
        model.identifier = Some(remote.identifier());
        if model.name.is_empty() {
            model.name = remote.name.clone();
        }
        if model.species.is_empty() {
            model.species = remote.species.clone();
        }
        Ok(model)
    }
}

type Pattern = OnceLock<Result<Regex, regex::Error>>;

fn re(cell: &'static Pattern, pattern: &str) -> Result<&'static Regex, ConversionError> {
    cell.get_or_init(|| Regex::new(pattern))
        .as_ref()
        .map_err(|e| ConversionError::Pattern(e.to_string()))
}

/// Attribute list of a start tag. A `>` inside a quoted value does not end the tag.
const TAG_ATTRS: &str = r#"((?:[^>"']|"[^"]*"|'[^']*')*?)"#;

fn root_re() -> Result<&'static Regex, ConversionError> {
    static CELL: Pattern = OnceLock::new();
    re(&CELL, &format!(r"(?s)<Pathway\b{TAG_ATTRS}/?>"))
}

fn node_re() -> Result<&'static Regex, ConversionError> {
    static CELL: Pattern = OnceLock::new();
    re(&CELL, &format!(r"(?s)<DataNode\b{TAG_ATTRS}(?:/>|>(.*?)</DataNode>)"))
}

fn graphics_re() -> Result<&'static Regex, ConversionError> {
    static CELL: Pattern = OnceLock::new();
    re(&CELL, &format!(r"(?s)<Graphics\b{TAG_ATTRS}/?>"))
}

fn xref_re() -> Result<&'static Regex, ConversionError> {
    static CELL: Pattern = OnceLock::new();
    re(&CELL, &format!(r"(?s)<Xref\b{TAG_ATTRS}/?>"))
}

fn attr_re() -> Result<&'static Regex, ConversionError> {
    static CELL: Pattern = OnceLock::new();
    re(&CELL, r#"([A-Za-z_][\w.:-]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
}

fn attrs(raw: &str) -> Result<HashMap<String, String>, ConversionError> {
    Ok(attr_re()?
        .captures_iter(raw)
        .filter_map(|c| {
            let value = c.get(2).or_else(|| c.get(3))?;
            Some((c[1].to_string(), unescape(value.as_str())))
        })
        .collect())
}

/// Decode the predefined XML entities and numeric character references. Anything else is
/// kept as written.
fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail
            .find(';')
            .and_then(|end| entity(&tail[1..end]).map(|c| (c, end)));
        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn entity(name: &str) -> Option<char> {
    match name {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "amp" => Some('&'),
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

fn first<'a>(map: &'a HashMap<String, String>, names: &[&str]) -> Option<&'a str> {
    names.iter().find_map(|n| map.get(*n)).map(String::as_str)
}

fn number(
    map: &HashMap<String, String>,
    names: &[&str],
    attr: &'static str,
    node: &str,
) -> Result<f64, ConversionError> {
    match first(map, names) {
        None => Ok(0.0),
        Some(v) => v.trim().parse().map_err(|_| ConversionError::BadNumber {
            node: node.to_string(),
            attr,
            value: v.to_string(),
        }),
    }
}

/// Parse a GPML document into a local model. `identifier` is left unset.
pub fn parse_gpml(gpml: &str) -> Result<LocalDocumentModel, ConversionError> {
    if gpml.trim().is_empty() {
        return Err(ConversionError::Empty);
    }
    let root = root_re()?.captures(gpml).ok_or(ConversionError::MissingRoot)?;
    let root_attrs = attrs(&root[1])?;

    let mut elements = Vec::new();
    for cap in node_re()?.captures_iter(gpml) {
        let node_attrs = attrs(&cap[1])?;
        let body = cap.get(2).map(|m| m.as_str()).unwrap_or("");

        let graph_id = first(&node_attrs, &["GraphId", "elementId"]).map(str::to_string);
        let label = first(&node_attrs, &["TextLabel", "textLabel"]).unwrap_or("").to_string();
        let node_name = graph_id.clone().unwrap_or_else(|| label.clone());

        let bounds = match graphics_re()?.captures(body) {
            Some(g) => {
                let ga = attrs(&g[1])?;
                Region::from_center(
                    number(&ga, &["CenterX", "centerX"], "CenterX", &node_name)?,
                    number(&ga, &["CenterY", "centerY"], "CenterY", &node_name)?,
                    number(&ga, &["Width", "width"], "Width", &node_name)?,
                    number(&ga, &["Height", "height"], "Height", &node_name)?,
                )
            }
            None => Region::default(),
        };

        let reference = match xref_re()?.captures(body) {
            Some(x) => {
                let xa = attrs(&x[1])?;
                let ns = first(&xa, &["Database", "dataSource"]).unwrap_or("").trim();
                let id = first(&xa, &["ID", "identifier"]).unwrap_or("").trim();
                (!ns.is_empty() && !id.is_empty()).then(|| ReferenceKey::new(ns, id))
            }
            None => None,
        };

        elements.push(DataNode {
            graph_id,
            label,
            reference,
            bounds,
        });
    }

    Ok(LocalDocumentModel {
        identifier: None,
        name: first(&root_attrs, &["Name", "title"]).unwrap_or("").to_string(),
        species: first(&root_attrs, &["Organism", "organism"]).unwrap_or("").to_string(),
        elements,
        gpml: gpml.to_string(),
    })
}
