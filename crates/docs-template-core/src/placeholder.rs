//! Binding of generic template placeholders to concrete data streams.
//!
//! The rewrite service emits `{{fields "data_stream_name"}}` and
//! `{{event "data_stream_name"}}`. With one entity these are bound in place.
//! With several, the field reference and sample event sections are rebuilt
//! so every entity gets its own heading and placeholder.

use std::fmt;
use std::sync::OnceLock;

use regex::{NoExpand, Regex};
use tracing::{debug, warn};

use crate::entity::EntityName;

/// Entity name used by unbound placeholders.
pub const GENERIC_ENTITY: &str = "data_stream_name";

pub const FIELDS_HEADER: &str = "### ECS field Reference";
pub const EVENT_HEADER: &str = "### Sample Event";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderKind {
    Fields,
    Event,
}

impl PlaceholderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PlaceholderKind::Fields => "fields",
            PlaceholderKind::Event => "event",
        }
    }
}

impl fmt::Display for PlaceholderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `{{kind "entity"}}` template token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub kind: PlaceholderKind,
    pub entity: String,
}

impl Placeholder {
    pub fn new(kind: PlaceholderKind, entity: impl Into<String>) -> Self {
        Self {
            kind,
            entity: entity.into(),
        }
    }

    pub fn is_generic(&self) -> bool {
        self.entity == GENERIC_ENTITY
    }

    pub fn render(&self) -> String {
        format!("{{{{{} \"{}\"}}}}", self.kind, self.entity)
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"\{\{\s*(fields|event)\s+"([^"\n]+)"\s*\}\}"#)
            .expect("placeholder pattern is valid")
    })
}

fn generic_pattern(kind: PlaceholderKind) -> &'static Regex {
    static FIELDS: OnceLock<Regex> = OnceLock::new();
    static EVENT: OnceLock<Regex> = OnceLock::new();
    let (cell, keyword) = match kind {
        PlaceholderKind::Fields => (&FIELDS, "fields"),
        PlaceholderKind::Event => (&EVENT, "event"),
    };
    cell.get_or_init(|| {
        Regex::new(&format!(
            r#"\{{\{{\s*{keyword}\s+"{GENERIC_ENTITY}"\s*\}}\}}"#
        ))
        .expect("generic placeholder pattern is valid")
    })
}

/// Every placeholder in `document`, generic or bound, in document order.
pub fn find_placeholders(document: &str) -> Vec<Placeholder> {
    placeholder_pattern()
        .captures_iter(document)
        .map(|caps| {
            let kind = match &caps[1] {
                "fields" => PlaceholderKind::Fields,
                _ => PlaceholderKind::Event,
            };
            Placeholder::new(kind, &caps[2])
        })
        .collect()
}

/// Rewrite generic placeholders in `document` for the discovered `entities`.
///
/// Never fails: documents whose structure cannot be recognised degrade to
/// binding every generic placeholder to the first entity.
pub fn rewrite_placeholders(document: &str, entities: &[EntityName]) -> String {
    match entities {
        [] => document.to_owned(),
        [only] => bind_generic(document, only),
        [first, ..] => match split_sections(document) {
            Some(sections) => rebuild_sections(&sections, entities),
            None => {
                warn!(
                    entity = %first,
                    count = entities.len(),
                    "section headers not found, binding placeholders to the first entity only"
                );
                bind_generic(document, first)
            }
        },
    }
}

/// Replace every generic placeholder with one naming `entity`.
pub fn bind_generic(document: &str, entity: &EntityName) -> String {
    let fields = Placeholder::new(PlaceholderKind::Fields, entity.as_str()).render();
    let event = Placeholder::new(PlaceholderKind::Event, entity.as_str()).render();

    let bound = generic_pattern(PlaceholderKind::Fields).replace_all(document, NoExpand(&fields));
    generic_pattern(PlaceholderKind::Event)
        .replace_all(&bound, NoExpand(&event))
        .into_owned()
}

enum Anchor {
    Fields,
    Event,
}

struct Sections<'a> {
    prefix: &'a str,
    rest: &'a str,
    anchor: Anchor,
}

/// Split around the first header that occurs exactly once.
fn split_sections(document: &str) -> Option<Sections<'_>> {
    [(FIELDS_HEADER, Anchor::Fields), (EVENT_HEADER, Anchor::Event)]
        .into_iter()
        .find_map(|(header, anchor)| {
            split_once_exact(document, header).map(|(prefix, rest)| Sections {
                prefix,
                rest,
                anchor,
            })
        })
}

/// Split on `separator` only when it occurs exactly once.
fn split_once_exact<'a>(text: &'a str, separator: &str) -> Option<(&'a str, &'a str)> {
    let (before, after) = text.split_once(separator)?;
    if after.contains(separator) {
        return None;
    }
    Some((before, after))
}

fn rebuild_sections(sections: &Sections<'_>, entities: &[EntityName]) -> String {
    let mut output = String::with_capacity(sections.prefix.len() + sections.rest.len() + 256);
    output.push_str(sections.prefix);
    push_entity_section(&mut output, FIELDS_HEADER, PlaceholderKind::Fields, entities);

    let tail = match sections.anchor {
        Anchor::Event => Some(sections.rest),
        Anchor::Fields => split_once_exact(sections.rest, EVENT_HEADER).map(|(_, tail)| tail),
    };

    match tail {
        Some(tail) => {
            push_entity_section(&mut output, EVENT_HEADER, PlaceholderKind::Event, entities);
            output.push_str(tail);
        }
        None => {
            debug!("no sample event section after the field reference");
            let first = &entities[0];
            output.push_str(&bind_generic(sections.rest, first));
        }
    }

    output
}

fn push_entity_section(
    output: &mut String,
    header: &str,
    kind: PlaceholderKind,
    entities: &[EntityName],
) {
    output.push_str(header);
    output.push_str("\n\n");
    for entity in entities {
        output.push_str("#### ");
        output.push_str(entity.as_str());
        output.push_str("\n\n");
        output.push_str(&Placeholder::new(kind, entity.as_str()).render());
        output.push_str("\n\n");
    }
}
