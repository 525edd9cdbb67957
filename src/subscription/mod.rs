// src/subscription/mod.rs
//! Subscription payload parsing: speculative decoding plus record extraction.

pub mod decode;
pub mod extract;

pub use decode::{decode, decode_bytes};
pub use extract::{
    classify_and_extract, extract, has_scheme_prefix, ConfigRecord, PayloadFormat,
    DEFAULT_PROFILE_LABEL, SCHEME_PREFIXES,
};
