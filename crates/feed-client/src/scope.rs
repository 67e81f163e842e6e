//! The block-with-context DSL: a `Scope` value carrying an activity and a
//! named-data bundle, passed explicitly into a caller supplied closure. No
//! implicit receiver rewriting.

use std::collections::HashMap;

use serde_json::Value;

use crate::activity::Activity;

pub struct Scope<'a> {
    activity: &'a Activity,
    bindings: HashMap<String, Value>,
}

impl<'a> Scope<'a> {
    pub fn activity(&self) -> &Activity {
        self.activity
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.bindings.get(key)
    }
}

/// Run `body` with a `Scope` bound to `activity` and `bindings`.
pub fn with_scope<'a, T>(
    activity: &'a Activity,
    bindings: HashMap<String, Value>,
    body: impl FnOnce(&Scope<'a>) -> T,
) -> T {
    let scope = Scope { activity, bindings };
    body(&scope)
}
