//! Shared utility functions for dsa-coder.
//!
//! JSON extraction from model replies, code fence handling for display, and
//! image data URI encoding.

pub mod code_fence;
pub mod data_uri;
pub mod json_extraction;

pub use code_fence::{ensure_fenced, strip_code_fence};
pub use data_uri::{
    encode_data_uri, encode_image_file, image_mime_for_path, validate_image_data_uri, DataUri,
    DEFAULT_MAX_IMAGE_BYTES,
};
pub use json_extraction::{
    find_matching_brace, try_extract_json_object, JsonExtractionError, JsonExtractionResult,
};
