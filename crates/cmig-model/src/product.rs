use serde::{Deserialize, Serialize};

use crate::enums::UnsoldReason;
use crate::ids::{BrandId, CategoryId, LegacyId, ProductId, SubmissionId};

/// One attribute line on a product: exactly one value per line. Multi-value
/// source fields are split into several lines before they get here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeLine {
    pub attribute: String,
    pub value: String,
}

/// A sellable item, owned by a submission.
///
/// After migration a product is in exactly one of three terminal states:
/// available (published, stock > 0, no unsold reason), withdrawn
/// (unpublished, stock 0, unsold reason set), or sold (unpublished,
/// stock 0, one historical order line).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub legacy_id: Option<LegacyId>,
    /// Internal reference code, unique when present.
    pub default_code: Option<String>,
    pub name: String,
    pub list_price: f64,
    pub submission_id: SubmissionId,
    pub stock: f64,
    pub published: bool,
    pub brand_id: Option<BrandId>,
    pub public_category_id: Option<CategoryId>,
    pub internal_category_id: Option<CategoryId>,
    pub attributes: Vec<AttributeLine>,
    pub unsold_reason: Option<UnsoldReason>,
    /// Internal description; migration appends withdrawal notes here.
    pub description: Option<String>,
    pub description_ecommerce: Option<String>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub seo_keywords: Option<String>,
    #[serde(skip)]
    pub image: Option<Vec<u8>>,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub legacy_id: Option<LegacyId>,
    pub default_code: Option<String>,
    pub name: String,
    pub list_price: f64,
    pub submission_id: SubmissionId,
    pub brand_id: Option<BrandId>,
    pub public_category_id: Option<CategoryId>,
    pub internal_category_id: Option<CategoryId>,
    pub description_ecommerce: Option<String>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub seo_keywords: Option<String>,
    pub image: Option<Vec<u8>>,
}

impl Product {
    /// Whether the product already carries the given attribute line.
    pub fn has_attribute(&self, attribute: &str, value: &str) -> bool {
        self.attributes
            .iter()
            .any(|line| line.attribute.eq_ignore_ascii_case(attribute) && line.value == value)
    }

    /// Append one attribute line unless an identical one exists.
    pub fn add_attribute(&mut self, attribute: &str, value: &str) {
        if !self.has_attribute(attribute, value) {
            self.attributes.push(AttributeLine {
                attribute: attribute.to_string(),
                value: value.to_string(),
            });
        }
    }
}
