//! API description document: model, route collection, building and customization.

mod builder;
mod customize;
mod model;
mod routes;
pub mod schema;

pub use builder::DocumentBuilder;
pub use customize::{
    customizers_for, DocumentCustomizer, ExtensionsCustomizer, InfoCustomizer, OAuth2Customizer,
    OperationIdNormalizer, ServersCustomizer,
};
pub use model::{
    ApiDocument, Components, Info, MediaTypeObject, OAuthFlow, OAuthFlows, OperationObject,
    ParameterObject, Paths, RequestBodyObject, ResponseObject, SchemaObject, SecurityRequirement,
    SecurityScheme, ServerObject, TagObject,
};
pub use routes::{join_paths, HttpMethod, RouteMapping, RouteTable};
