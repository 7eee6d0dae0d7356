//! Declarative metadata tags and the storage that owns them.

use crate::error::{GeneratorError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

/// Value of a tag attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Str(String),
    List(Vec<AttrValue>),
    Tag(Tag),
}

impl AttrValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_tag(&self) -> Option<&Tag> {
        match self {
            AttrValue::Tag(t) => Some(t),
            _ => None,
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Str(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Str(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

impl From<Tag> for AttrValue {
    fn from(value: Tag) -> Self {
        AttrValue::Tag(value)
    }
}

impl From<Vec<Tag>> for AttrValue {
    fn from(value: Vec<Tag>) -> Self {
        AttrValue::List(value.into_iter().map(AttrValue::Tag).collect())
    }
}

/// A declarative marker attached to a type or method.
///
/// Tags are values; an owner replaces a tag by installing a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub kind: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, AttrValue>,
}

impl Tag {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with(mut self, attribute: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attributes.insert(attribute.into(), value.into());
        self
    }

    pub fn attr(&self, attribute: &str) -> Option<&AttrValue> {
        self.attributes.get(attribute)
    }

    /// String attribute; empty strings count as unset.
    pub fn str_attr(&self, attribute: &str) -> Option<&str> {
        self.attr(attribute)
            .and_then(AttrValue::as_str)
            .filter(|s| !s.is_empty())
    }

    pub fn bool_attr(&self, attribute: &str) -> Option<bool> {
        self.attr(attribute).and_then(AttrValue::as_bool)
    }

    pub fn tag_attr(&self, attribute: &str) -> Option<&Tag> {
        self.attr(attribute).and_then(AttrValue::as_tag)
    }

    /// String-array attribute. A single string is read as a one-element array.
    pub fn strings(&self, attribute: &str) -> Vec<String> {
        match self.attr(attribute) {
            Some(AttrValue::Str(s)) => vec![s.clone()],
            Some(AttrValue::List(items)) => items
                .iter()
                .filter_map(AttrValue::as_str)
                .map(String::from)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Tag-array attribute. A single nested tag is read as a one-element array.
    pub fn tags(&self, attribute: &str) -> Vec<&Tag> {
        match self.attr(attribute) {
            Some(AttrValue::Tag(t)) => vec![t],
            Some(AttrValue::List(items)) => items.iter().filter_map(AttrValue::as_tag).collect(),
            _ => Vec::new(),
        }
    }

    /// Copy of this tag answering `attribute` with `value` and every other
    /// attribute with its current value.
    pub fn with_attribute(&self, attribute: &str, value: AttrValue) -> Tag {
        let mut captured = self.attributes.clone();
        captured.insert(attribute.to_string(), value);
        Tag {
            kind: self.kind.clone(),
            attributes: captured,
        }
    }
}

/// Tag storage of one owner.
///
/// Loaded units get replaceable slots. Native Rust types carry frozen storage,
/// which rejects every replacement.
#[derive(Debug)]
pub enum TagStorage {
    Slots(RwLock<BTreeMap<String, Arc<Tag>>>),
    Frozen(BTreeMap<String, Arc<Tag>>),
}

impl TagStorage {
    pub fn replaceable(tags: Vec<Tag>) -> Self {
        TagStorage::Slots(RwLock::new(Self::index(tags)))
    }

    pub fn frozen(tags: Vec<Tag>) -> Self {
        TagStorage::Frozen(Self::index(tags))
    }

    fn index(tags: Vec<Tag>) -> BTreeMap<String, Arc<Tag>> {
        tags.into_iter()
            .map(|t| (t.kind.clone(), Arc::new(t)))
            .collect()
    }

    /// The currently installed tag of `kind`.
    pub fn get(&self, kind: &str) -> Option<Arc<Tag>> {
        match self {
            TagStorage::Slots(slots) => slots
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .get(kind)
                .cloned(),
            TagStorage::Frozen(tags) => tags.get(kind).cloned(),
        }
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.get(kind).is_some()
    }

    /// Replace the tag of `kind` with the result of `rebuild`, atomically.
    ///
    /// `rebuild` sees the currently installed tag and runs under the slot lock;
    /// returning `None` leaves the tag in place. Returns the replaced tag, or
    /// `None` when nothing was installed.
    pub fn replace_with<F>(
        &self,
        owner: &str,
        kind: &str,
        attribute: &str,
        rebuild: F,
    ) -> Result<Option<Arc<Tag>>>
    where
        F: FnOnce(&Tag) -> Option<Tag>,
    {
        let patch_error = |message: &str| GeneratorError::Patch {
            owner: owner.to_string(),
            tag: kind.to_string(),
            attribute: attribute.to_string(),
            message: message.to_string(),
        };

        match self {
            TagStorage::Frozen(tags) => {
                let Some(current) = tags.get(kind) else {
                    return Ok(None);
                };
                if rebuild(current.as_ref()).is_some() {
                    Err(patch_error("metadata storage of native types cannot be replaced"))
                } else {
                    Ok(None)
                }
            }
            TagStorage::Slots(slots) => {
                let mut slots = slots
                    .write()
                    .map_err(|_| patch_error("metadata slot lock is poisoned"))?;
                let Some(current) = slots.get(kind).cloned() else {
                    return Ok(None);
                };
                let Some(replacement) = rebuild(&current) else {
                    return Ok(None);
                };
                if replacement.kind != current.kind {
                    return Err(patch_error("replacement tag changes the tag kind"));
                }
                slots.insert(kind.to_string(), Arc::new(replacement));
                Ok(Some(current))
            }
        }
    }
}
