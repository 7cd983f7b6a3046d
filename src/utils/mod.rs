pub mod case;
pub mod mime;

pub use case::to_camel_case;
pub use mime::{content_type_or_default, detect_content_type, DEFAULT_CONTENT_TYPE};
