// src/models/mod.rs
// DOCUMENTATION: Models module organization
// PURPOSE: Re-export model components and shared serde helpers

pub mod place;
pub mod review;
pub mod user;

pub use place::*;
pub use review::*;
pub use user::*;

use serde::{Deserialize, Deserializer};

/// Ids arrive as strings from some backends and as integers from others
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Int(i64),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(s) => s,
            RawId::Int(n) => n.to_string(),
        }
    }
}

/// Deserialize a string-or-integer id into a String
pub(crate) fn string_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    RawId::deserialize(deserializer).map(String::from)
}

/// Optional variant of [`string_id`]
pub(crate) fn opt_string_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<RawId>::deserialize(deserializer).map(|id| id.map(String::from))
}

/// Numbers that may be sent as JSON strings (Kakao sends coordinates as "127.02")
#[derive(Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Num(f64),
    Text(String),
}

pub(crate) fn opt_lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<RawNumber>::deserialize(deserializer)? {
        Some(RawNumber::Num(n)) => Some(n),
        Some(RawNumber::Text(s)) => s.trim().parse().ok(),
        None => None,
    })
}
