//!  Delulu Airbnb Agent
//!
//!  Copyright (C) 2026  Mamy Ratsimbazafy
//!
//!  This program is free software: you can redistribute it and/or modify
//!  it under the terms of the GNU Affero General Public License as published by
//!  the Free Software Foundation, either version 3 of the License, or
//!  (at your option) any later version.
//!
//!  This program is distributed in the hope that it will be useful,
//!  but WITHOUT ANY WARRANTY; without even the implied warranty of
//!  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//!  GNU Affero General Public License for more details.
//!
//!  You should have received a copy of the GNU Affero General Public License
//!  along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! # Value Projection
//!
//! Side-effect free reshaping of untyped page JSON.
//!
//! Three passes are applied to the payload embedded in a listings page:
//! - [`prune`] strips null and empty-string values and collapses `{ "value": X }` wrappers,
//! - [`project`] keeps only the fields enumerated by an [`AllowSchema`],
//! - [`flatten_singletons`] replaces single-element arrays held by object fields with their element.

use serde_json::{Map, Value};
use thiserror::Error;

/// Key of the single-field wrapper objects used by the upstream JSON API.
const WRAPPER_KEY: &str = "value";

/// GraphQL bookkeeping field carried by every upstream object.
const TYPENAME_KEY: &str = "__typename";

/// Recursive field allow-list.
///
/// `Leaf` copies the value found under the field as-is,
/// `Fields` recurses into it with a nested allow-list.
#[derive(Debug, Clone, PartialEq)]
pub enum AllowSchema {
    Leaf,
    Fields(Vec<(String, AllowSchema)>),
}

#[derive(Debug, Error)]
#[error("invalid allow schema at `{path}`: expected `true` or an object")]
pub struct InvalidAllowSchema {
    pub path: String,
}

impl AllowSchema {
    pub fn get(&self, field: &str) -> Option<&AllowSchema> {
        match self {
            AllowSchema::Leaf => None,
            AllowSchema::Fields(fields) => fields
                .iter()
                .find(|(name, _)| name == field)
                .map(|(_, rule)| rule),
        }
    }

    fn from_json_at(value: &Value, path: &str) -> Result<Self, InvalidAllowSchema> {
        match value {
            Value::Bool(true) => Ok(AllowSchema::Leaf),
            Value::Object(map) => map
                .iter()
                .map(|(name, rule)| -> Result<(String, AllowSchema), InvalidAllowSchema> {
                    let child_path = if path.is_empty() {
                        name.clone()
                    } else {
                        format!("{path}.{name}")
                    };
                    Ok((name.clone(), Self::from_json_at(rule, &child_path)?))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(AllowSchema::Fields),
            _ => Err(InvalidAllowSchema {
                path: path.to_string(),
            }),
        }
    }
}

impl TryFrom<&Value> for AllowSchema {
    type Error = InvalidAllowSchema;

    /// Reads a schema written as JSON, e.g. `{"title": true, "items": {"title": true}}`.
    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        Self::from_json_at(value, "")
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Removes null and empty-string values, drops `__typename` fields and
/// collapses `{ "value": X }` wrappers into `X`, recursively and in place.
///
/// Only objects with exactly one field named `value` are collapsed.
pub fn prune(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|key, child| key != TYPENAME_KEY && !is_blank(child));
            for child in map.values_mut() {
                prune(child);
            }
        }
        Value::Array(items) => {
            items.retain(|item| !is_blank(item));
            for item in items.iter_mut() {
                prune(item);
            }
        }
        _ => return,
    }

    let unwrapped = match value {
        Value::Object(map) if map.len() == 1 => map.remove(WRAPPER_KEY),
        _ => None,
    };
    if let Some(inner) = unwrapped {
        *value = inner;
    }
}

/// Builds a new value holding only the fields allowed by `schema`.
///
/// Arrays are projected element-wise, scalars are returned unchanged and
/// fields missing from `value` produce no output field.
pub fn project(value: &Value, schema: &AllowSchema) -> Value {
    let fields = match schema {
        AllowSchema::Leaf => return value.clone(),
        AllowSchema::Fields(fields) => fields,
    };

    match value {
        Value::Array(items) => Value::Array(items.iter().map(|item| project(item, schema)).collect()),
        Value::Object(map) => {
            let mut picked = Map::new();
            for (name, rule) in fields {
                if let Some(child) = map.get(name) {
                    picked.insert(name.clone(), project(child, rule));
                }
            }
            Value::Object(picked)
        }
        scalar => scalar.clone(),
    }
}

/// Replaces every object field holding a one-element array by that element, depth-first.
pub fn flatten_singletons(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for child in map.values_mut() {
                flatten_singletons(child);
                if let Value::Array(items) = child {
                    if items.len() == 1 {
                        let only = items.remove(0);
                        *child = only;
                    }
                }
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                flatten_singletons(item);
            }
        }
        _ => {}
    }
}

/// Projects then flattens; the pipeline every extracted record goes through.
pub fn project_flat(value: &Value, schema: &AllowSchema) -> Value {
    let mut projected = project(value, schema);
    flatten_singletons(&mut projected);
    projected
}
