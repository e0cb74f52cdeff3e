use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A catalog entry. Movies are read-only through the API and enter the
/// store via the seed path, so `Deserialize` here doubles as the seed
/// file format. Identifiers are generated on insert when absent.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct Movie {
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub genre: Genre,
    pub director: Director,
    #[serde(rename = "ImageURL", default)]
    pub image_url: String,
    #[serde(default)]
    pub featured: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct Genre {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct Director {
    pub name: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub birth: Option<i32>,
    #[serde(default)]
    pub death: Option<i32>,
}
