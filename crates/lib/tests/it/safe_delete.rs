use confmodel::{
    Error,
    controller::{DeleteResult, ModelController},
    safe_delete::Usage,
};
use serde_json::json;

use crate::helpers::*;

fn usages_of(err: &Error) -> &[Usage] {
    match err {
        Error::Controller(err) => err.usages(),
        other => panic!("expected a controller error, got {other:?}"),
    }
}

fn aliases_left(ctx: &TestContext) -> usize {
    ctx.aliases().model().unwrap().collection(&ALIASES.into()).unwrap().len()
}

#[test]
fn test_referenced_entry_is_not_deleted() {
    let ctx = TestContext::new();
    let alias = ctx.add_alias("webservers", "host");
    let rule = ctx.add_rule(json!({"description": "allow web", "source": alias}));
    let commits = ctx.commits();

    let err = ctx.aliases().del_base(&post(json!({})), ALIASES, &alias).unwrap_err();
    assert!(err.is_safe_delete_blocked());
    assert_eq!(
        usages_of(&err),
        &[Usage {
            reference: format!("Filter.rules.rule.{rule}"),
            module: "Filter".to_string(),
            description: "allow web".to_string(),
        }]
    );
    assert_eq!(err.to_string(), format!("Filter - allow web {{Filter.rules.rule.{rule}}}"));

    assert_eq!(ctx.commits(), commits);
    assert_eq!(aliases_left(&ctx), 1);
}

#[test]
fn test_every_reference_is_listed() {
    let ctx = TestContext::new();
    let alias = ctx.add_alias("dns", "host");
    ctx.add_rule(json!({"description": "first", "source": alias}));
    ctx.add_rule(json!({"description": "second", "source": alias}));

    let err = ctx.aliases().del_base(&post(json!({})), ALIASES, &alias).unwrap_err();
    let descriptions: Vec<&str> = usages_of(&err).iter().map(|u| u.description.as_str()).collect();
    assert_eq!(descriptions, ["first", "second"]);
    assert_eq!(err.to_string().lines().count(), 2);
}

#[test]
fn test_unreferenced_entry_is_deleted() {
    let ctx = TestContext::new();
    let used = ctx.add_alias("used", "host");
    let unused = ctx.add_alias("unused", "network");
    ctx.add_rule(json!({"description": "keeps used", "source": used}));

    let response = ctx.aliases().del_base(&post(json!({})), ALIASES, &unused).unwrap();
    assert_eq!(response.result, DeleteResult::Deleted);
    assert_eq!(aliases_left(&ctx), 1);
}

#[test]
fn test_references_ignored_without_safe_delete() {
    let ctx = TestContext::new();
    let alias = ctx.add_alias("loose", "host");
    ctx.add_rule(json!({"description": "dangling soon", "source": alias}));

    let controller = ctx.aliases().with_safe_delete(false);
    let response = controller.del_base(&post(json!({})), ALIASES, &alias).unwrap();
    assert_eq!(response.result, DeleteResult::Deleted);
    assert_eq!(aliases_left(&ctx), 0);
}

#[test]
fn test_list_references_are_not_detected() {
    let ctx = TestContext::new();
    let first = ctx.add_alias("a", "port");
    let second = ctx.add_alias("b", "port");
    ctx.add_rule(json!({"description": "both", "destinations": [first, second]}));

    let response = ctx.aliases().del_base(&post(json!({})), ALIASES, &first).unwrap();
    assert_eq!(response.result, DeleteResult::Deleted);
}

#[test]
fn test_delete_missing_entry_reports_not_found() {
    let ctx = TestContext::new();
    ctx.add_alias("present", "host");
    let commits = ctx.commits();

    let response = ctx.aliases().del_base(&post(json!({})), ALIASES, "absent").unwrap();
    assert_eq!(response.result, DeleteResult::NotFound);
    assert_eq!(ctx.commits(), commits);
}

#[test]
fn test_delete_requires_post() {
    let ctx = TestContext::new();
    let alias = ctx.add_alias("kept", "host");
    let response = ctx.aliases().del_base(&get(), ALIASES, &alias).unwrap();
    assert_eq!(response.result, DeleteResult::Failed);
    assert_eq!(aliases_left(&ctx), 1);
}

#[test]
fn test_readonly_user_cannot_delete() {
    let ctx = TestContext::new();
    let alias = ctx.add_alias("protected", "host");

    let request = post_as(readonly_user(), json!({}));
    let err = ctx.aliases().del_base(&request, ALIASES, &alias).unwrap_err();
    assert!(err.is_permission_denied());
    assert_eq!(aliases_left(&ctx), 1);
}

#[test]
fn test_custom_scanner_is_consulted() {
    use std::sync::Arc;

    use confmodel::{safe_delete::ReferenceScanner, tree::Element};

    #[derive(Debug)]
    struct EverythingUsed;

    impl ReferenceScanner for EverythingUsed {
        fn find_usages(&self, _document: &Element, uuid: &str) -> Vec<Usage> {
            vec![Usage {
                reference: format!("External.{uuid}"),
                module: "External".to_string(),
                description: "pinned".to_string(),
            }]
        }
    }

    let ctx = TestContext::new();
    let alias = ctx.add_alias("pinned", "host");
    let controller: ModelController = ctx.aliases().with_scanner(Arc::new(EverythingUsed));
    let err = controller.del_base(&post(json!({})), ALIASES, &alias).unwrap_err();
    assert!(err.is_safe_delete_blocked());
    assert_eq!(usages_of(&err)[0].module, "External");
}
