use confmodel::{
    Registered,
    constants::READONLY_PRIVILEGE,
    controller::{Principal, Request},
    model::{ModelDefinition, ModelRegistry},
    relation::{DataSource, RelationField},
    schema::{Choice, FieldDef, Mask, Schema},
};
use serde_json::Value;

pub use crate::context::TestContext;

pub const DNSCRYPT: &str = "OPNsense.DNSCrypt";
pub const ALIAS: &str = "OPNsense.Firewall.Alias";
pub const FILTER: &str = "OPNsense.Firewall.Filter";

pub const SERVERS: &str = "servers.server";
pub const ALIASES: &str = "aliases.alias";
pub const RULES: &str = "rules.rule";

/// Compiled-in DNSCrypt proxy model.
pub struct Dnscrypt;

impl Registered for Dnscrypt {
    fn type_id() -> &'static str {
        DNSCRYPT
    }
}

impl ModelDefinition for Dnscrypt {
    fn schema() -> Schema {
        Schema::new(DNSCRYPT, "OPNsense.dnscrypt", "1.0.0")
            .field(FieldDef::container(
                "general",
                vec![
                    FieldDef::boolean("enabled").default_value("0"),
                    FieldDef::integer("port", Some(1), Some(65535)).default_value("5353"),
                    FieldDef::text("listen")
                        .default_value("127.0.0.1")
                        .mask(Mask::new(r"^[0-9.]+$").unwrap())
                        .message("Please provide a valid IPv4 address."),
                ],
            ))
            .field(FieldDef::container(
                "servers",
                vec![FieldDef::array(
                    "server",
                    vec![
                        FieldDef::boolean("enabled").default_value("1"),
                        FieldDef::text("name")
                            .required()
                            .unique()
                            .mask(Mask::new(r"^[a-zA-Z0-9_-]+$").unwrap()),
                        FieldDef::text("address"),
                        FieldDef::options(
                            "proto",
                            vec![Choice::new("udp", "UDP"), Choice::new("tcp", "TCP")],
                        )
                        .default_value("udp"),
                        FieldDef::text("description"),
                    ],
                )],
            ))
    }
}

pub fn alias_schema() -> Schema {
    Schema::new(ALIAS, "OPNsense.Firewall.Alias", "1.0.1").field(FieldDef::container(
        "aliases",
        vec![FieldDef::array(
            "alias",
            vec![
                FieldDef::boolean("enabled").default_value("1"),
                FieldDef::text("name").required().unique(),
                FieldDef::options(
                    "type",
                    vec![
                        Choice::new("host", "Host(s)"),
                        Choice::new("network", "Network(s)"),
                        Choice::new("port", "Port(s)"),
                    ],
                )
                .default_value("host"),
                FieldDef::text("content"),
                FieldDef::text("description"),
            ],
        )],
    ))
}

pub fn host_aliases() -> RelationField {
    RelationField::new(vec![
        DataSource::new(ALIAS, ALIASES, "name").filter("type", "^(host|network)$"),
    ])
}

pub fn filter_schema() -> Schema {
    Schema::new(FILTER, "OPNsense.Firewall.Filter", "1.0.4").field(FieldDef::container(
        "rules",
        vec![FieldDef::array(
            "rule",
            vec![
                FieldDef::boolean("enabled").default_value("1"),
                FieldDef::integer("sequence", Some(1), Some(99999)).default_value("1"),
                FieldDef::text("description"),
                FieldDef::relation("source", host_aliases()),
                FieldDef::relation(
                    "destinations",
                    RelationField::new(vec![DataSource::new(ALIAS, ALIASES, "name")])
                        .preserve_order()
                        .multiple(),
                ),
                FieldDef::relation(
                    "parent",
                    RelationField::new(vec![DataSource::new(FILTER, RULES, "description")]),
                ),
            ],
        )],
    ))
}

pub fn registry() -> ModelRegistry {
    let mut registry = ModelRegistry::new();
    registry.register::<Dnscrypt>();
    registry.register_schema(alias_schema());
    registry.register_schema(filter_schema());
    registry
}

pub fn admin() -> Principal {
    Principal::new("root")
}

pub fn readonly_user() -> Principal {
    Principal::new("auditor").with_privilege(READONLY_PRIVILEGE)
}

/// A POST request carrying `params`, which must be a JSON object.
pub fn post_as(principal: Principal, params: Value) -> Request {
    match params {
        Value::Object(params) => Request::post(principal, params),
        other => panic!("request parameters must be an object, got {other}"),
    }
}

pub fn post(params: Value) -> Request {
    post_as(admin(), params)
}

pub fn get() -> Request {
    Request::get(admin())
}
