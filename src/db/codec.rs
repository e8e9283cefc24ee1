//! JSON-in-TEXT column discipline.
//!
//! Array- and object-valued post fields (`tags`, `images`, `seo`) live in
//! scalar TEXT columns. Every write serializes through [`encode`], every read
//! decodes through [`decode_or_empty`]. Malformed stored text never fails the
//! read path: it decodes to the field's empty value.

use serde::de::DeserializeOwned;
use serde::Serialize;

pub fn encode<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "null".to_string())
}

pub fn decode_or_empty<T: DeserializeOwned + Default>(text: &str) -> T {
    serde_json::from_str(text).unwrap_or_default()
}
