use serde::{Deserialize, Serialize};

use crate::ids::BrandId;

/// A product brand. The brand name doubles as the faceted-filter attribute
/// value, so names are unique.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Brand {
    pub id: BrandId,
    pub name: String,
    pub published: bool,
    pub description: Option<String>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub seo_keywords: Option<String>,
    #[serde(skip)]
    pub logo: Option<Vec<u8>>,
}

#[derive(Debug, Clone, Default)]
pub struct NewBrand {
    pub name: String,
    pub published: bool,
    pub description: Option<String>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub seo_keywords: Option<String>,
    pub logo: Option<Vec<u8>>,
}
