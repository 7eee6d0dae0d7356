//! Run-time replacement of already loaded metadata tags.
//!
//! Overrides are applied to the tag currently installed on an owner, so repeated
//! overrides compose. Every reader that later asks the owner for the tag sees the
//! replacement.

use super::kinds::{self, attr};
use super::tag::{AttrValue, Tag, TagStorage};
use crate::error::Result;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Something that owns replaceable metadata tags (a loaded type or method).
pub trait TagOwner {
    /// Name used in diagnostics, e.g. `org.acme.Api#list`.
    fn owner_name(&self) -> String;

    fn tag_storage(&self) -> &TagStorage;

    fn tag(&self, kind: &str) -> Option<Arc<Tag>> {
        self.tag_storage().get(kind)
    }

    fn has_tag(&self, kind: &str) -> bool {
        self.tag_storage().contains(kind)
    }
}

/// One applied override.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataOverride {
    pub owner: String,
    pub tag_kind: String,
    pub attribute: String,
    pub value: AttrValue,
}

/// Applies metadata overrides and keeps a journal of what it changed.
#[derive(Debug, Default)]
pub struct MetadataPatcher {
    journal: Mutex<Vec<MetadataOverride>>,
}

impl MetadataPatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `attribute` of the owner's `kind` tag answer `value` from now on.
    ///
    /// Returns the tag that was replaced, or `None` when the owner does not carry a
    /// tag of that kind (no-op).
    pub fn override_attribute(
        &self,
        owner: &dyn TagOwner,
        kind: &str,
        attribute: &str,
        value: AttrValue,
    ) -> Result<Option<Arc<Tag>>> {
        self.rewrite_attribute(owner, kind, attribute, move |_| Some(value))
    }

    /// Give every open-object schema of the owner's `Operation` tag an explicit
    /// `type`.
    ///
    /// A schema qualifies when its `implementation` is the open object type and its
    /// `type` is empty. Response content schemas and parameter schemas are both
    /// rewritten. Returns the number of attributes overridden.
    pub fn override_object_schemas(&self, owner: &dyn TagOwner, schema_type: &str) -> Result<usize> {
        let mut overridden = 0;

        let responses = self.rewrite_attribute(owner, kinds::OPERATION, attr::RESPONSES, |current| {
            rewrite_tags(current?, &|response| rewrite_response(response, schema_type))
        })?;
        if responses.is_some() {
            overridden += 1;
        }

        let parameters = self.rewrite_attribute(owner, kinds::OPERATION, attr::PARAMETERS, |current| {
            rewrite_tags(current?, &|parameter| rewrite_parameter(parameter, schema_type))
        })?;
        if parameters.is_some() {
            overridden += 1;
        }

        Ok(overridden)
    }

    /// Install the value `rewrite` derives from the attribute's current value.
    ///
    /// The current value is read and the replacement installed under the owner's
    /// slot lock. `rewrite` returning `None` leaves the tag untouched.
    fn rewrite_attribute<F>(
        &self,
        owner: &dyn TagOwner,
        kind: &str,
        attribute: &str,
        rewrite: F,
    ) -> Result<Option<Arc<Tag>>>
    where
        F: FnOnce(Option<&AttrValue>) -> Option<AttrValue>,
    {
        let owner_name = owner.owner_name();
        let mut installed = None;
        let replaced = owner
            .tag_storage()
            .replace_with(&owner_name, kind, attribute, |current| {
                let value = rewrite(current.attr(attribute))?;
                installed = Some(value.clone());
                Some(current.with_attribute(attribute, value))
            })?;

        if let (Some(_), Some(value)) = (&replaced, installed) {
            debug!("Overrode {}.{} on {}", kind, attribute, owner_name);
            self.journal
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .push(MetadataOverride {
                    owner: owner_name,
                    tag_kind: kind.to_string(),
                    attribute: attribute.to_string(),
                    value,
                });
        }

        Ok(replaced)
    }

    /// Overrides applied so far, in order.
    pub fn applied(&self) -> Vec<MetadataOverride> {
        self.journal
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

fn rewrite_schema(schema: &Tag, schema_type: &str) -> Option<Tag> {
    let is_open = schema.str_attr(attr::IMPLEMENTATION) == Some(kinds::OPEN_OBJECT_TYPE);
    if is_open && schema.str_attr(attr::TYPE).is_none() {
        Some(schema.with_attribute(attr::TYPE, schema_type.into()))
    } else {
        None
    }
}

fn rewrite_content(content: &Tag, schema_type: &str) -> Option<Tag> {
    let schema = rewrite_schema(content.tag_attr(attr::SCHEMA)?, schema_type)?;
    Some(content.with_attribute(attr::SCHEMA, schema.into()))
}

fn rewrite_response(response: &Tag, schema_type: &str) -> Option<Tag> {
    let content = rewrite_tags(response.attr(attr::CONTENT)?, &|c| rewrite_content(c, schema_type))?;
    Some(response.with_attribute(attr::CONTENT, content))
}

fn rewrite_parameter(parameter: &Tag, schema_type: &str) -> Option<Tag> {
    let schema = rewrite_schema(parameter.tag_attr(attr::SCHEMA)?, schema_type)?;
    Some(parameter.with_attribute(attr::SCHEMA, schema.into()))
}

/// Rewrite a tag or tag list; `None` when nothing changed.
fn rewrite_tags(value: &AttrValue, rewrite: &dyn Fn(&Tag) -> Option<Tag>) -> Option<AttrValue> {
    match value {
        AttrValue::Tag(tag) => rewrite(tag).map(AttrValue::Tag),
        AttrValue::List(items) => {
            let mut changed = false;
            let rewritten = items
                .iter()
                .map(|item| match item.as_tag().and_then(rewrite) {
                    Some(tag) => {
                        changed = true;
                        AttrValue::Tag(tag)
                    }
                    None => item.clone(),
                })
                .collect();
            changed.then_some(AttrValue::List(rewritten))
        }
        _ => None,
    }
}
