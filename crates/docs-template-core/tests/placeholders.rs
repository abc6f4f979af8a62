use docs_template_core::{
    find_placeholders, rewrite_placeholders, EntityName, Placeholder, PlaceholderKind,
};
use pretty_assertions::assert_eq;

fn entities(names: &[&str]) -> Vec<EntityName> {
    names
        .iter()
        .map(|name| EntityName::new(*name).expect("valid entity name"))
        .collect()
}

const TWO_SECTION_DOC: &str = "# Package\n\
\n\
Intro text.\n\
\n\
### ECS field Reference\n\
\n\
{{fields \"data_stream_name\"}}\n\
\n\
### Sample Event\n\
\n\
An example event looks as following:\n\
\n\
{{event \"data_stream_name\"}}\n";

#[test]
fn no_entities_is_identity() {
    let doc = "# Title\n{{fields \"data_stream_name\"}}\r\nodd  spacing\n";
    assert_eq!(rewrite_placeholders(doc, &[]), doc);
}

#[test]
fn single_entity_binds_every_generic_placeholder() {
    let doc = "# Reference\n\n\
{{fields \"data_stream_name\"}}\n\n\
Some prose mentioning data_stream_name.\n\n\
{{event  \"data_stream_name\"}}\n\n\
{{fields \"data_stream_name\"}}\n";

    let rewritten = rewrite_placeholders(doc, &entities(&["logs"]));

    assert_eq!(
        rewritten,
        "# Reference\n\n\
{{fields \"logs\"}}\n\n\
Some prose mentioning data_stream_name.\n\n\
{{event \"logs\"}}\n\n\
{{fields \"logs\"}}\n"
    );
    assert!(find_placeholders(&rewritten)
        .iter()
        .all(|placeholder| placeholder.entity == "logs"));
}

#[test]
fn multiple_entities_get_their_own_blocks_in_order() {
    let rewritten = rewrite_placeholders(TWO_SECTION_DOC, &entities(&["access", "error"]));

    assert_eq!(
        rewritten,
        "# Package\n\
\n\
Intro text.\n\
\n\
### ECS field Reference\n\
\n\
#### access\n\
\n\
{{fields \"access\"}}\n\
\n\
#### error\n\
\n\
{{fields \"error\"}}\n\
\n\
### Sample Event\n\
\n\
#### access\n\
\n\
{{event \"access\"}}\n\
\n\
#### error\n\
\n\
{{event \"error\"}}\n\
\n\
\n\
\n\
An example event looks as following:\n\
\n\
{{event \"data_stream_name\"}}\n"
    );

    let bound: Vec<Placeholder> = find_placeholders(&rewritten)
        .into_iter()
        .filter(|placeholder| !placeholder.is_generic())
        .collect();
    assert_eq!(
        bound,
        vec![
            Placeholder::new(PlaceholderKind::Fields, "access"),
            Placeholder::new(PlaceholderKind::Fields, "error"),
            Placeholder::new(PlaceholderKind::Event, "access"),
            Placeholder::new(PlaceholderKind::Event, "error"),
        ]
    );
}

#[test]
fn headers_missing_falls_back_to_first_entity() {
    let doc = "# Package\n\n{{fields \"data_stream_name\"}}\n\n{{event \"data_stream_name\"}}\n";
    let set = entities(&["a", "b", "c"]);

    let first = rewrite_placeholders(doc, &set);
    let second = rewrite_placeholders(doc, &set);

    assert_eq!(first, "# Package\n\n{{fields \"a\"}}\n\n{{event \"a\"}}\n");
    assert_eq!(first, second);
}

#[test]
fn repeated_field_header_is_not_a_usable_split() {
    let doc = "### ECS field Reference\nA\n### ECS field Reference\nB {{fields \"data_stream_name\"}}\n";
    let rewritten = rewrite_placeholders(doc, &entities(&["x", "y"]));
    assert_eq!(
        rewritten,
        "### ECS field Reference\nA\n### ECS field Reference\nB {{fields \"x\"}}\n"
    );
}

#[test]
fn sample_event_header_alone_anchors_both_sections() {
    let doc = "# Package\n\n### Sample Event\n\nTrailing text.\n";
    let rewritten = rewrite_placeholders(doc, &entities(&["x", "y"]));

    assert_eq!(
        rewritten,
        "# Package\n\n\
### ECS field Reference\n\n\
#### x\n\n{{fields \"x\"}}\n\n\
#### y\n\n{{fields \"y\"}}\n\n\
### Sample Event\n\n\
#### x\n\n{{event \"x\"}}\n\n\
#### y\n\n{{event \"y\"}}\n\n\
\n\nTrailing text.\n"
    );
}

#[test]
fn missing_sample_event_binds_remaining_events_to_first_entity() {
    let doc = "Intro\n### ECS field Reference\nold fields\n{{event \"data_stream_name\"}}\n";
    let rewritten = rewrite_placeholders(doc, &entities(&["x", "y"]));

    assert_eq!(
        rewritten,
        "Intro\n\
### ECS field Reference\n\n\
#### x\n\n{{fields \"x\"}}\n\n\
#### y\n\n{{fields \"y\"}}\n\n\
\nold fields\n{{event \"x\"}}\n"
    );
}

#[test]
fn every_rendered_placeholder_round_trips() {
    for name in ["logs", "audit-trail", "a b", "ünïcode"] {
        for kind in [PlaceholderKind::Fields, PlaceholderKind::Event] {
            let placeholder = Placeholder::new(kind, name);
            let found = find_placeholders(&format!("before {placeholder} after"));
            assert_eq!(found, vec![placeholder]);
        }
    }
}
