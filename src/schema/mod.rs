//! Schema validation for envelopes, argument schemas and tool export.

pub mod arguments;
pub mod envelope;
pub mod export;
pub mod types;

pub use arguments::{SchemaValidator, ValidationResult};
pub use envelope::{validate_request_envelope, validate_response_envelope};
pub use export::{check_examples, ToolDefinition};
pub use types::{InputSchema, PropertySchema, SchemaType};
