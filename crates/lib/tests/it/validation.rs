use confmodel::{
    controller::SaveResult,
    tree::{Element, Reference},
    validation::Messages,
};
use serde_json::json;

use crate::helpers::*;

fn with_legacy_server(name: &str) -> TestContext {
    TestContext::with_document(
        Element::new("config").with_child(
            Element::new("OPNsense").with_child(
                Element::new("dnscrypt").with_attribute("version", "1.0.0").with_child(
                    Element::new("servers").with_child(
                        Element::new("server")
                            .with_attribute("uuid", "legacy")
                            .with_field("name", name),
                    ),
                ),
            ),
        ),
    )
}

#[test]
fn test_distinct_messages_for_one_field_become_a_list() {
    let ctx = with_legacy_server("bad name");

    let response = ctx
        .dnscrypt()
        .add_base(&post(json!({"server": {"name": "bad name"}})), "server", SERVERS, None)
        .unwrap();
    assert_eq!(response.result, SaveResult::Failed);
    assert_eq!(
        response.validations.get("server.name"),
        Some(&Messages::Multiple(vec![
            "Please specify a valid value.".to_string(),
            "Value should be unique.".to_string(),
        ]))
    );
    assert_eq!(response.validations.len(), 1, "the untouched legacy entry is not reported");
}

#[test]
fn test_validation_report_wire_shape() {
    let ctx = TestContext::new();
    let controller = ctx.dnscrypt();
    let mut model = controller.model().unwrap();
    let uuid = model.add(&SERVERS.into()).unwrap();

    let reference = Reference::new(SERVERS, uuid.as_str());
    let node_ref = reference.to_string();
    let report = controller.validate(&model, Some(&node_ref), Some("server"));
    assert!(!report.is_valid());
    assert_eq!(
        serde_json::to_value(&report).unwrap(),
        json!({"result": "failed", "validations": {"server.name": "A value is required."}})
    );

    model
        .set_entry(&reference, json!({"name": "ok"}).as_object().unwrap())
        .unwrap();
    let report = controller.validate(&model, Some(&node_ref), Some("server"));
    assert!(report.is_valid());
    assert_eq!(serde_json::to_value(&report).unwrap(), json!({"result": ""}));
}

#[test]
fn test_validation_without_node_ref_prefixes_paths() {
    let ctx = TestContext::new();
    let controller = ctx.dnscrypt();
    let mut model = controller.model().unwrap();
    model.set_nodes(&json!({"general": {"port": "abc"}}));

    let report = controller.validate(&model, None, None);
    assert_eq!(
        report.validations.get("dnscrypt.general.port"),
        Some(&Messages::Single("Value should be an integer.".to_string()))
    );

    let report = controller.validate(&model, None, Some("custom"));
    assert!(report.validations.get("custom.general.port").is_some());
}

#[test]
fn test_boolean_fields_reject_other_tokens() {
    let ctx = TestContext::new();
    let response = ctx
        .dnscrypt()
        .set_settings(&post(json!({"dnscrypt": {"general": {"enabled": "yes"}}})))
        .unwrap();
    assert_eq!(
        response.validations.get("dnscrypt.general.enabled"),
        Some(&Messages::Single("Value should be a boolean (0,1).".to_string()))
    );
}

#[test]
fn test_failed_validation_never_writes() {
    let ctx = TestContext::new();
    let uuid = ctx.add_server("kept");
    let before = ctx.storage.saved();

    for payload in [
        json!({"server": {"name": ""}}),
        json!({"server": {"proto": "dot"}}),
        json!({"server": {"enabled": "2"}}),
    ] {
        let response = ctx
            .dnscrypt()
            .set_base(&post(payload), "server", SERVERS, &uuid, None)
            .unwrap();
        assert_eq!(response.result, SaveResult::Failed);
    }
    assert_eq!(ctx.commits(), 1);
    assert_eq!(ctx.storage.saved(), before);
}
