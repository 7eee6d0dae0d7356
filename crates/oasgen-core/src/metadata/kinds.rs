//! Well-known tag kinds and attribute names.

// Handler markers
pub const REST_CONTROLLER: &str = "RestController";
pub const CONTROLLER: &str = "Controller";
pub const REQUEST_MAPPING: &str = "RequestMapping";

// Mapping shortcuts, each implying one method
pub const GET_MAPPING: &str = "GetMapping";
pub const POST_MAPPING: &str = "PostMapping";
pub const PUT_MAPPING: &str = "PutMapping";
pub const PATCH_MAPPING: &str = "PatchMapping";
pub const DELETE_MAPPING: &str = "DeleteMapping";

// Documentation tags
pub const OPERATION: &str = "Operation";
pub const API_RESPONSE: &str = "ApiResponse";
pub const CONTENT: &str = "Content";
pub const SCHEMA: &str = "Schema";
pub const PARAMETER: &str = "Parameter";
pub const GROUP: &str = "Tag";

// Parameter bindings
pub const PATH_VARIABLE: &str = "PathVariable";
pub const REQUEST_PARAM: &str = "RequestParam";
pub const REQUEST_BODY: &str = "RequestBody";

/// Tag kinds that mark a type as a request handler.
pub const HANDLER_KINDS: [&str; 3] = [REST_CONTROLLER, REQUEST_MAPPING, CONTROLLER];

/// Attribute names.
pub mod attr {
    pub const VALUE: &str = "value";
    pub const PATH: &str = "path";
    pub const METHOD: &str = "method";
    pub const PRODUCES: &str = "produces";
    pub const CONSUMES: &str = "consumes";
    pub const NAME: &str = "name";
    pub const DESCRIPTION: &str = "description";
    pub const SUMMARY: &str = "summary";
    pub const OPERATION_ID: &str = "operationId";
    pub const TAGS: &str = "tags";
    pub const DEPRECATED: &str = "deprecated";
    pub const HIDDEN: &str = "hidden";
    pub const RESPONSES: &str = "responses";
    pub const RESPONSE_CODE: &str = "responseCode";
    pub const CONTENT: &str = "content";
    pub const MEDIA_TYPE: &str = "mediaType";
    pub const SCHEMA: &str = "schema";
    pub const IMPLEMENTATION: &str = "implementation";
    pub const TYPE: &str = "type";
    pub const FORMAT: &str = "format";
    pub const PATTERN: &str = "pattern";
    pub const EXAMPLE: &str = "example";
    pub const REF: &str = "ref";
    pub const PARAMETERS: &str = "parameters";
    pub const IN: &str = "in";
    pub const REQUIRED: &str = "required";
}

/// Identifier of the open, unconstrained object type.
pub const OPEN_OBJECT_TYPE: &str = "Object";
