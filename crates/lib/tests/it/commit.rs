use std::sync::{Arc, OnceLock};

use confmodel::{
    controller::{ModelController, SaveResult, SettingsHook},
    model::Model,
    tree::Element,
};
use serde_json::json;

use crate::helpers::*;

/// Adds a server through a second controller the first time it runs, so a
/// commit lands between validation and save of the outer update.
#[derive(Debug)]
struct AddsServerOnce {
    controller: ModelController,
    name: &'static str,
    added: OnceLock<String>,
}

impl AddsServerOnce {
    fn new(controller: ModelController, name: &'static str) -> Self {
        Self {
            controller,
            name,
            added: OnceLock::new(),
        }
    }
}

impl SettingsHook for AddsServerOnce {
    fn before_save(&self, _model: &Model) -> Option<String> {
        if self.added.get().is_none() {
            let response = self
                .controller
                .add_base(&post(json!({"server": {"name": self.name}})), "server", SERVERS, None)
                .ok()?;
            if let Some(uuid) = response.uuid {
                let _ = self.added.set(uuid);
            }
        }
        None
    }
}

fn count_uuid(element: &Element, uuid: &str) -> usize {
    let own = usize::from(element.uuid() == Some(uuid));
    own + element
        .children()
        .iter()
        .map(|child| count_uuid(child, uuid))
        .sum::<usize>()
}

#[test]
fn test_intervening_commit_survives_settings_update() {
    let ctx = TestContext::new();
    let hook = Arc::new(AddsServerOnce::new(ctx.dnscrypt(), "racer"));
    let controller = ctx.dnscrypt().with_hook(hook.clone());

    let response = controller
        .set_settings(&post(json!({"dnscrypt": {"general": {"port": "5454"}}})))
        .unwrap();
    assert!(response.is_saved());
    assert_eq!(ctx.commits(), 2);

    let uuid = hook.added.get().expect("hook did not add a server");
    let server = ctx.dnscrypt().get_base("server", SERVERS, Some(uuid)).unwrap();
    assert_eq!(server["server"]["name"], "racer");

    let settings = ctx.dnscrypt().get_settings(&get()).unwrap();
    assert_eq!(settings["dnscrypt"]["general"]["port"], "5454");
}

#[test]
fn test_reapplied_update_is_validated_again() {
    let ctx = TestContext::new();
    let hook = Arc::new(AddsServerOnce::new(ctx.dnscrypt(), "racer"));
    let controller = ctx.dnscrypt().with_hook(hook.clone());

    let response = controller
        .set_settings(&post(
            json!({"dnscrypt": {"servers": {"server": {"new": {"name": "racer"}}}}}),
        ))
        .unwrap();
    assert_eq!(response.result, SaveResult::Failed);
    assert_eq!(response.validations.len(), 1);
    let (field, _) = response.validations.iter().next().unwrap();
    assert!(field.starts_with("dnscrypt.servers.server."), "{field}");
    assert!(field.ends_with(".name"), "{field}");

    assert_eq!(ctx.commits(), 1);
    let servers = ctx.dnscrypt().model().unwrap();
    assert_eq!(servers.collection(&SERVERS.into()).unwrap().len(), 1);
}

#[test]
fn test_stale_working_copy_is_refused() {
    let ctx = TestContext::new();
    let controller = ctx.dnscrypt();
    let mut stale = controller.model().unwrap();
    stale.set_nodes(&json!({"general": {"port": "5454"}}));

    let uuid = ctx.add_server("fresh");
    let err = controller.save(&post(json!({})), &stale).unwrap_err();
    assert!(err.is_conflict());
    assert!(!err.is_path_error());

    let server = ctx.dnscrypt().get_base("server", SERVERS, Some(&uuid)).unwrap();
    assert_eq!(server["server"]["name"], "fresh");
    let settings = ctx.dnscrypt().get_settings(&get()).unwrap();
    assert_eq!(settings["dnscrypt"]["general"]["port"], "5353");
}

#[test]
fn test_posted_ids_from_other_models_are_not_reused() {
    let ctx = TestContext::new();
    let alias = ctx.add_alias("lan", "network");

    let mut servers = serde_json::Map::new();
    servers.insert(alias.clone(), json!({"name": "dup"}));
    let response = ctx
        .dnscrypt()
        .set_settings(&post(json!({"dnscrypt": {"servers": {"server": servers}}})))
        .unwrap();
    assert!(response.is_saved());

    assert_eq!(count_uuid(&ctx.document(), &alias), 1);
    let model = ctx.dnscrypt().model().unwrap();
    let added = model.collection(&SERVERS.into()).unwrap();
    assert_eq!(added.len(), 1);
    assert_eq!(added[0].field("name"), Some("dup"));
    assert_ne!(added[0].uuid(), Some(alias.as_str()));
}
