//! Declarative metadata: tag values, their storage and the patcher that replaces them.

pub mod kinds;
mod patcher;
mod tag;

pub use kinds::attr;
pub use patcher::{MetadataOverride, MetadataPatcher, TagOwner};
pub use tag::{AttrValue, Tag, TagStorage};
