//! Constants used throughout the confmodel library.
//!
//! This module provides central definitions for reserved attribute names,
//! field names and string tokens shared by the model, controller and
//! safe-delete layers.

/// Attribute carrying the unique id of a repeated entry.
pub const UUID_ATTR: &str = "uuid";

/// Attribute marking the root element of a versioned module.
pub const VERSION_ATTR: &str = "version";

/// Field flipped by the toggle operation.
pub const ENABLED_FIELD: &str = "enabled";

/// Field names consulted, in order, for a human readable entry label.
pub const DESCRIPTION_FIELDS: [&str; 3] = ["description", "descr", "name"];

/// Privilege that denies configuration writes.
pub const READONLY_PRIVILEGE: &str = "user-config-readonly";

/// String token for a set boolean field.
pub const TRUE_TOKEN: &str = "1";

/// String token for an unset boolean field.
pub const FALSE_TOKEN: &str = "0";

/// Separator between values of multi-select fields.
pub const LIST_SEPARATOR: char = ',';

/// Title of the error raised when a delete is refused.
pub const ITEM_IN_USE_TITLE: &str = "Item in use by";

/// Grid actions accepted by the action router.
pub const GRID_ACTIONS: [&str; 6] = ["search", "get", "set", "add", "del", "toggle"];
