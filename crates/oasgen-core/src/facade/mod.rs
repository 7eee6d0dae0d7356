//! Container contract and its registry-backed facade.

mod capability_facade;
mod contract;

pub use capability_facade::CapabilityFacade;
pub use contract::{ContainerContract, PostProcessor, ValueResolver};
