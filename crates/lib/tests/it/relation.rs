use confmodel::{
    controller::SaveResult,
    relation::{DataSource, OptionData, RelationField, RelationResolver},
    validation::Messages,
};
use serde_json::json;

use crate::helpers::*;

fn labels(options: &[OptionData]) -> Vec<&str> {
    options.iter().map(|o| o.label.as_str()).collect()
}

fn selected(options: &[OptionData]) -> Vec<&str> {
    options
        .iter()
        .filter(|o| o.selected)
        .map(|o| o.label.as_str())
        .collect()
}

#[test]
fn test_relation_options_follow_filters_and_sort_by_label() {
    let ctx = TestContext::new();
    ctx.add_alias("web10", "host");
    ctx.add_alias("Lan", "network");
    ctx.add_alias("web2", "host");
    ctx.add_alias("http", "port");

    let options = ctx.rules().options(RULES, "source", None).unwrap().unwrap();
    assert_eq!(labels(&options), ["Lan", "web2", "web10"]);
    assert!(selected(&options).is_empty());
}

#[test]
fn test_current_value_is_selected() {
    let ctx = TestContext::new();
    let lan = ctx.add_alias("lan", "network");
    ctx.add_alias("dmz", "network");
    let rule = ctx.add_rule(json!({"description": "from lan", "source": lan}));

    let options = ctx.rules().options(RULES, "source", Some(&rule)).unwrap().unwrap();
    assert_eq!(selected(&options), ["lan"]);
}

#[test]
fn test_preserved_order_lists_selection_first() {
    let ctx = TestContext::new();
    let a = ctx.add_alias("a", "port");
    ctx.add_alias("b", "port");
    let c = ctx.add_alias("c", "port");
    let rule = ctx.add_rule(json!({"description": "ordered", "destinations": [c, a]}));

    let options = ctx
        .rules()
        .options(RULES, "destinations", Some(&rule))
        .unwrap()
        .unwrap();
    assert_eq!(labels(&options), ["c", "a", "b"]);
    assert_eq!(selected(&options), ["c", "a"]);

    let fetched = ctx.rules().get_base("rule", RULES, Some(&rule)).unwrap();
    assert_eq!(fetched["rule"]["destinations"], format!("{c},{a}"));
}

#[test]
fn test_relation_value_must_exist() {
    let ctx = TestContext::new();
    let port = ctx.add_alias("ssh", "port");

    let response = ctx
        .rules()
        .add_base(
            &post(json!({"rule": {"description": "bad", "source": port}})),
            "rule",
            RULES,
            None,
        )
        .unwrap();
    assert_eq!(response.result, SaveResult::Failed);
    assert_eq!(
        response.validations.get("rule.source"),
        Some(&Messages::Single("Related item not found.".to_string()))
    );
}

#[test]
fn test_single_relation_rejects_lists() {
    let ctx = TestContext::new();
    let a = ctx.add_alias("a", "host");
    let b = ctx.add_alias("b", "host");

    let response = ctx
        .rules()
        .add_base(
            &post(json!({"rule": {"source": [a, b]}})),
            "rule",
            RULES,
            None,
        )
        .unwrap();
    assert_eq!(response.result, SaveResult::Failed);
    assert!(response.validations.get("rule.source").is_some());
}

#[test]
fn test_commits_refresh_dependent_options() {
    let ctx = TestContext::new();
    let first = ctx.add_alias("first", "host");
    ctx.add_rule(json!({"description": "uses first", "source": first}));

    let before = ctx.rules().options(RULES, "source", None).unwrap().unwrap();
    assert_eq!(labels(&before), ["first"]);
    assert!(ctx.cache.get(&host_aliases().cache_key()).is_some());

    let second = ctx.add_alias("second", "host");
    assert!(ctx.cache.get(&host_aliases().cache_key()).is_none());

    let rule = ctx.add_rule(json!({"description": "uses second", "source": second}));
    let options = ctx.rules().options(RULES, "source", Some(&rule)).unwrap().unwrap();
    assert_eq!(labels(&options), ["first", "second"]);
    assert_eq!(selected(&options), ["second"]);
}

#[test]
fn test_cached_options_survive_unrelated_commits() {
    let ctx = TestContext::new();
    ctx.add_alias("first", "host");
    ctx.rules().options(RULES, "source", None).unwrap();
    let key = host_aliases().cache_key();
    assert!(ctx.cache.get(&key).is_some());

    ctx.add_server("unrelated");
    ctx.add_rule(json!({"description": "unrelated"}));
    assert!(ctx.cache.get(&key).is_some());

    assert!(ctx.cache.invalidate(&key));
    let fresh = ctx.rules().options(RULES, "source", None).unwrap().unwrap();
    assert_eq!(labels(&fresh), ["first"]);
}

#[test]
fn test_failed_add_is_not_visible_through_cached_options() {
    let ctx = TestContext::new();
    let response = ctx
        .rules()
        .add_base(
            &post(json!({"rule": {"description": "ghost", "sequence": "abc", "parent": "nope"}})),
            "rule",
            RULES,
            None,
        )
        .unwrap();
    assert_eq!(response.result, SaveResult::Failed);

    let parent = RelationField::new(vec![DataSource::new(FILTER, RULES, "description")]);
    assert!(ctx.cache.get(&parent.cache_key()).is_none());

    let document = ctx.document();
    let options = RelationResolver::new(&ctx.registry, &document, &ctx.cache).options(&parent);
    assert!(options.is_empty());
    assert_eq!(ctx.commits(), 0);
}

#[test]
fn test_own_model_relation_sees_working_copy() {
    let ctx = TestContext::new();
    let first = ctx.add_rule(json!({"description": "base rule"}));

    let options = ctx.rules().options(RULES, "parent", Some(&first)).unwrap().unwrap();
    assert_eq!(labels(&options), ["base rule"]);

    ctx.add_rule(json!({"description": "another rule"}));
    let options = ctx.rules().options(RULES, "parent", Some(&first)).unwrap().unwrap();
    assert_eq!(labels(&options), ["another rule", "base rule"]);

    let child = ctx.add_rule(json!({"description": "child", "parent": first}));
    let fetched = ctx.rules().get_base("rule", RULES, Some(&child)).unwrap();
    assert_eq!(fetched["rule"]["parent"], first.as_str());
}

#[test]
fn test_grid_shows_relation_labels() {
    let ctx = TestContext::new();
    let lan = ctx.add_alias("lan", "network");
    ctx.add_rule(json!({"description": "from lan", "source": lan}));

    let response = ctx
        .rules()
        .search_base(&get(), RULES, &["description", "source"], None, None, None)
        .unwrap();
    assert_eq!(response.rows[0]["source"], "lan");
}

#[test]
fn test_static_options_keep_declared_order() {
    let ctx = TestContext::new();
    let uuid = ctx.add_server("tcp-server");
    ctx.dnscrypt()
        .set_base(&post(json!({"server": {"proto": "tcp"}})), "server", SERVERS, &uuid, None)
        .unwrap();

    let options = ctx.dnscrypt().options(SERVERS, "proto", Some(&uuid)).unwrap().unwrap();
    assert_eq!(
        options,
        vec![
            OptionData {
                value: "udp".to_string(),
                label: "UDP".to_string(),
                selected: false,
            },
            OptionData {
                value: "tcp".to_string(),
                label: "TCP".to_string(),
                selected: true,
            },
        ]
    );

    let defaults = ctx.dnscrypt().options(SERVERS, "proto", None).unwrap().unwrap();
    assert_eq!(selected(&defaults), ["UDP"]);
}

#[test]
fn test_options_edge_cases() {
    let ctx = TestContext::new();
    ctx.add_server("x");
    assert!(ctx.dnscrypt().options(SERVERS, "proto", Some("missing")).unwrap().is_none());

    let err = ctx.dnscrypt().options(SERVERS, "name", None).unwrap_err();
    assert!(err.is_path_error());
}

#[test]
fn test_resolution_is_deterministic() {
    let ctx = TestContext::new();
    for name in ["b10", "B2", "a", "c"] {
        ctx.add_alias(name, "host");
    }
    let document = ctx.document();
    let resolver = RelationResolver::new(&ctx.registry, &document, &ctx.cache);
    let first = resolver.load(&host_aliases());
    let second = resolver.load(&host_aliases());
    assert_eq!(first, second);

    let order: Vec<&str> = first.iter().map(|(_, label)| label).collect();
    assert_eq!(order, ["a", "B2", "b10", "c"]);
}
