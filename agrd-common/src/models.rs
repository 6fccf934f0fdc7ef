//! Game catalog model shared by the proxy response and the client backlog
//!
//! Field names follow the upstream catalog projection
//! (`name,cover.image_id,first_release_date,genres.name`) so the same type
//! decodes a search response and a persisted backlog snapshot.

use serde::{Deserialize, Deserializer, Serialize};

/// One game as returned by the catalog search
///
/// Compared by `id` everywhere; the other fields are display data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSummary {
    /// Unique upstream identifier
    pub id: u64,

    /// Display name (empty when a record carries no name or `null`)
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,

    /// Cover image reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<Cover>,

    /// First release date, Unix epoch seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_release_date: Option<i64>,

    /// Genres in upstream order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genres: Option<Vec<Genre>>,
}

/// Cover image reference (`cover.image_id`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cover {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
}

/// Genre reference (`genres.name`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl GameSummary {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            cover: None,
            first_release_date: None,
            genres: None,
        }
    }

    pub fn cover_image_id(&self) -> Option<&str> {
        self.cover.as_ref().and_then(|c| c.image_id.as_deref())
    }

    /// Genre names in upstream order, skipping unnamed entries
    pub fn genre_names(&self) -> Vec<&str> {
        self.genres
            .as_deref()
            .unwrap_or_default()
            .iter()
            .filter_map(|g| g.name.as_deref())
            .collect()
    }
}
