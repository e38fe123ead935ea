use confmodel::controller::ToggleResult;
use serde_json::json;

use crate::helpers::*;

fn enabled(ctx: &TestContext, uuid: &str) -> String {
    let fetched = ctx.dnscrypt().get_base("server", SERVERS, Some(uuid)).unwrap();
    fetched["server"]["enabled"].as_str().unwrap().to_string()
}

#[test]
fn test_toggle_flips_flag() {
    let ctx = TestContext::new();
    let uuid = ctx.add_server("flip");
    let controller = ctx.dnscrypt();

    let response = controller.toggle_base(&post(json!({})), SERVERS, &uuid, None).unwrap();
    assert_eq!(response.result, ToggleResult::Disabled);
    assert!(response.changed());
    assert_eq!(enabled(&ctx, &uuid), "0");

    let response = controller.toggle_base(&post(json!({})), SERVERS, &uuid, None).unwrap();
    assert_eq!(response.result, ToggleResult::Enabled);
    assert!(response.changed());
    assert_eq!(enabled(&ctx, &uuid), "1");
}

#[test]
fn test_toggle_to_current_value_is_a_no_op() {
    let ctx = TestContext::new();
    let uuid = ctx.add_server("steady");
    let commits = ctx.commits();

    let response = ctx
        .dnscrypt()
        .toggle_base(&post(json!({})), SERVERS, &uuid, Some("1"))
        .unwrap();
    assert_eq!(response.result, ToggleResult::Enabled);
    assert_eq!(response.changed, Some(false));
    assert_eq!(ctx.commits(), commits);
}

#[test]
fn test_toggle_to_explicit_value() {
    let ctx = TestContext::new();
    let uuid = ctx.add_server("explicit");

    let response = ctx
        .dnscrypt()
        .toggle_base(&post(json!({})), SERVERS, &uuid, Some("0"))
        .unwrap();
    assert_eq!(response.result, ToggleResult::Disabled);
    assert!(response.changed());
    assert_eq!(enabled(&ctx, &uuid), "0");
}

#[test]
fn test_empty_desired_value_flips() {
    let ctx = TestContext::new();
    let uuid = ctx.add_server("empty");
    let response = ctx
        .dnscrypt()
        .toggle_base(&post(json!({})), SERVERS, &uuid, Some(""))
        .unwrap();
    assert_eq!(response.result, ToggleResult::Disabled);
    assert!(response.changed());
}

#[test]
fn test_invalid_desired_value_fails() {
    let ctx = TestContext::new();
    let uuid = ctx.add_server("strict");
    let commits = ctx.commits();

    let response = ctx
        .dnscrypt()
        .toggle_base(&post(json!({})), SERVERS, &uuid, Some("yes"))
        .unwrap();
    assert_eq!(response.result, ToggleResult::Failed);
    assert_eq!(response.changed, Some(false));
    assert_eq!(ctx.commits(), commits);
    assert_eq!(enabled(&ctx, &uuid), "1");
}

#[test]
fn test_toggle_unknown_entry_fails() {
    let ctx = TestContext::new();
    ctx.add_server("other");
    let response = ctx
        .dnscrypt()
        .toggle_base(&post(json!({})), SERVERS, "missing", None)
        .unwrap();
    assert_eq!(response.result, ToggleResult::Failed);
    assert_eq!(response.changed, None);
}

#[test]
fn test_toggle_requires_post() {
    let ctx = TestContext::new();
    let uuid = ctx.add_server("get");
    let response = ctx.dnscrypt().toggle_base(&get(), SERVERS, &uuid, None).unwrap();
    assert_eq!(response.result, ToggleResult::Failed);
    assert_eq!(enabled(&ctx, &uuid), "1");
}

#[test]
fn test_toggle_wire_shape() {
    let ctx = TestContext::new();
    let uuid = ctx.add_server("wire");
    let response = ctx
        .dnscrypt()
        .toggle_base(&post(json!({})), SERVERS, &uuid, Some("0"))
        .unwrap();
    assert_eq!(
        serde_json::to_value(response).unwrap(),
        json!({"result": "Disabled", "changed": true})
    );
}

#[test]
fn test_readonly_user_cannot_toggle() {
    let ctx = TestContext::new();
    let uuid = ctx.add_server("locked");
    let err = ctx
        .dnscrypt()
        .toggle_base(&post_as(readonly_user(), json!({})), SERVERS, &uuid, None)
        .unwrap_err();
    assert!(err.is_permission_denied());
    assert_eq!(enabled(&ctx, &uuid), "1");
}
