use serde::{Deserialize, Serialize};

use crate::ids::CategoryId;

/// A public-facing webshop category node. Categories form a hierarchy via
/// `parent`; the leaf can be linked to a `Type` attribute value so the
/// category tree and the faceted filter stay in sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicCategory {
    pub id: CategoryId,
    pub name: String,
    pub parent: Option<CategoryId>,
    pub linked_type_value: Option<String>,
}

/// A flat backend-only category mirroring the public leaf; used for
/// internal reporting, never shown on the shop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InternalCategory {
    pub id: CategoryId,
    pub name: String,
}
