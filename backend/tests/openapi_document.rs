//! Checks on the exported OpenAPI document.

use std::collections::BTreeSet;

use garage_backend::ApiDoc;
use utoipa::OpenApi;

#[test]
fn every_operation_has_a_declared_tag_and_unique_id() {
    let doc = ApiDoc::openapi();
    let declared: BTreeSet<String> = doc
        .tags
        .iter()
        .flatten()
        .map(|tag| tag.name.clone())
        .collect();

    let mut ids = BTreeSet::new();
    let paths = &doc.paths.paths;
    for (path, item) in paths {
        let item = serde_json::to_value(item).expect("path item serialises");
        let operations = item.as_object().expect("path item object");
        for (method, operation) in operations.iter().filter(|(_, op)| op.get("responses").is_some()) {
            let tags = operation["tags"].as_array().expect("operation tags");
            assert!(
                tags.iter()
                    .filter_map(|tag| tag.as_str())
                    .all(|tag| declared.contains(tag)),
                "{method} {path} uses an undeclared tag"
            );
            if let Some(id) = operation["operationId"].as_str() {
                assert!(ids.insert(id.to_owned()), "duplicate operationId {id}");
            }
        }
    }
    assert!(paths.len() > 40, "expected the full API, found {}", paths.len());
}

#[test]
fn document_renders_as_json() {
    let json = ApiDoc::openapi().to_pretty_json().expect("render JSON");
    assert!(json.contains("\"BearerAuth\""));
    assert!(json.contains("/api/v1/webhooks/payments"));
}
