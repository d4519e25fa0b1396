// src/models/review.rs

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

use super::string_id;

/// Review author as embedded in review responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewUser {
    #[serde(deserialize_with = "string_id")]
    pub id: String,
    pub name: String,
}

/// Place review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    #[serde(deserialize_with = "string_id")]
    pub id: String,
    pub user: ReviewUser,
    pub rating: u8,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(deserialize_with = "utc_timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub upvotes: u32,
    #[serde(default)]
    pub downvotes: u32,
}

/// Request body of POST /locations/{id}/reviews
#[derive(Debug, Clone, Serialize, Validate)]
pub struct CreateReviewRequest {
    #[validate(range(min = 1, max = 5, message = "rating must be between 1 and 5"))]
    pub rating: u8,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 2000))]
    pub comment: Option<String>,
}

/// Up/down vote on someone else's review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewVote {
    Up,
    Down,
}

impl std::str::FromStr for ReviewVote {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" => Ok(ReviewVote::Up),
            "down" => Ok(ReviewVote::Down),
            other => Err(format!("vote must be 'up' or 'down', got '{}'", other)),
        }
    }
}

/// Body of POST /locations/{id}/review/{review_id}/rate
#[derive(Debug, Serialize)]
pub(crate) struct RateReviewRequest {
    pub rating: ReviewVote,
}

/// Vote totals after rating a review
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReviewVotes {
    #[serde(alias = "reviewId", deserialize_with = "string_id")]
    pub review_id: String,
    pub upvotes: u32,
    pub downvotes: u32,
}

/// The backend emits naive ISO timestamps (no offset); they are UTC
fn utc_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(dt) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(serde::de::Error::custom)
}
