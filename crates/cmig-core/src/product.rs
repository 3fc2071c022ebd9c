//! Product find-or-create/update and attribute handling.

use tracing::{debug, warn};

use cmig_model::{
    CategoryId, CustomerRepo, LegacyId, NewProduct, Product, ProductRepo, Submission,
    SubmissionRepo,
};

use crate::config::MigrationConfig;
use crate::images::ImageStore;
use crate::resolver::{BrandRef, CategorySlot};

/// Parsed product-row fields that feed the upsert (status signals are
/// handled separately by the classification engine).
#[derive(Debug, Clone, Default)]
pub struct ProductRowData {
    pub legacy_id: Option<LegacyId>,
    pub default_code: Option<String>,
    pub name: String,
    pub price: f64,
    pub image_url: String,
    pub extra_image_urls: Vec<String>,
    pub size: String,
    pub season: String,
    pub gender: String,
    pub condition_rating: String,
    pub description_ecommerce: String,
    pub seo_title: String,
    pub seo_description: String,
    pub seo_keywords: String,
}

/// The brand attribute every product line filters on.
pub const BRAND_ATTRIBUTE: &str = "Merk";

/// Gift cards were exported in the product file but migrate through the
/// voucher pipeline; their rows are recognized by name.
pub fn is_gift_card_name(name: &str) -> bool {
    let folded = name.to_lowercase();
    folded.contains("kadobon") || folded.contains("cadeaubon") || folded.contains("giftcard")
}

/// Split a legacy multi-value attribute field into one value per line.
pub fn split_attribute_values(raw: &str) -> Vec<String> {
    raw.replace('/', "|")
        .replace('&', "|")
        .replace(" en ", "|")
        .split('|')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn patch_text(target: &mut Option<String>, value: &str) {
    if !value.is_empty() {
        *target = Some(value.to_string());
    }
}

/// Find a product by legacy id or internal code and patch its descriptive
/// fields, or create it with image and attribute lines. Stock and
/// publication are left alone; the classification outcome decides those.
pub fn upsert_product<S>(
    store: &mut S,
    config: &MigrationConfig,
    images: &ImageStore,
    row: &ProductRowData,
    submission: &Submission,
    brand: Option<&BrandRef>,
    category: Option<&CategorySlot>,
    fallback_internal: CategoryId,
) -> cmig_model::Result<(Product, bool)>
where
    S: ProductRepo,
{
    let existing = row
        .legacy_id
        .as_ref()
        .and_then(|legacy| store.find_product_by_legacy_id(legacy))
        .or_else(|| {
            row.default_code
                .as_deref()
                .and_then(|code| store.find_product_by_code(code))
        });

    let legacy_key = row
        .legacy_id
        .as_ref()
        .map(|legacy| legacy.as_str().to_string())
        .unwrap_or_default();

    if let Some(mut product) = existing {
        if !row.name.is_empty() {
            product.name = row.name.clone();
        }
        product.submission_id = submission.id;
        if product.legacy_id.is_none() {
            product.legacy_id = row.legacy_id.clone();
        }
        if let Some(slot) = category {
            product.public_category_id = Some(slot.public_id);
            product.internal_category_id = Some(slot.internal_id);
        } else if product.internal_category_id.is_none() {
            product.internal_category_id = Some(fallback_internal);
        }
        if let Some(brand) = brand {
            product.brand_id = Some(brand.brand_id);
            product.add_attribute(BRAND_ATTRIBUTE, &brand.value_name);
        }
        patch_text(&mut product.description_ecommerce, &row.description_ecommerce);
        patch_text(&mut product.seo_title, &row.seo_title);
        patch_text(&mut product.seo_description, &row.seo_description);
        patch_text(&mut product.seo_keywords, &row.seo_keywords);
        if product.image.is_none() {
            product.image = fetch_first_image(images, row, &legacy_key);
        }
        store.update_product(&product)?;
        debug!(product = %product.name, "product patched");
        return Ok((product, false));
    }

    let default_code = match &row.default_code {
        Some(code) => code.clone(),
        None => {
            let count = store.products_in_submission(submission.id);
            format!("{}-{}", submission.name, count + 1)
        }
    };
    let image = fetch_first_image(images, row, &legacy_key);
    let mut product = store.insert_product(NewProduct {
        legacy_id: row.legacy_id.clone(),
        default_code: Some(default_code),
        name: row.name.clone(),
        list_price: row.price,
        submission_id: submission.id,
        brand_id: brand.map(|brand| brand.brand_id),
        public_category_id: category.map(|slot| slot.public_id),
        internal_category_id: Some(
            category.map(|slot| slot.internal_id).unwrap_or(fallback_internal),
        ),
        description_ecommerce: non_empty(&row.description_ecommerce),
        seo_title: non_empty(&row.seo_title),
        seo_description: non_empty(&row.seo_description),
        seo_keywords: non_empty(&row.seo_keywords),
        image,
    })?;

    attach_attributes(&mut product, config, row, brand, category);
    store.update_product(&product)?;
    Ok((product, true))
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn fetch_first_image(
    images: &ImageStore,
    row: &ProductRowData,
    legacy_key: &str,
) -> Option<Vec<u8>> {
    let mut candidates = std::iter::once(row.image_url.as_str())
        .chain(row.extra_image_urls.iter().map(String::as_str));
    candidates.find_map(|url| images.fetch(url, legacy_key))
}

fn attach_attributes(
    product: &mut Product,
    config: &MigrationConfig,
    row: &ProductRowData,
    brand: Option<&BrandRef>,
    category: Option<&CategorySlot>,
) {
    let size_attribute = if category.is_some_and(|slot| slot.is_shoe) {
        "Schoenmaat"
    } else {
        "Maat"
    };
    for value in split_attribute_values(&row.size) {
        product.add_attribute(size_attribute, &value);
    }
    for value in split_attribute_values(&row.season) {
        product.add_attribute("Seizoen", &value);
    }
    for value in split_attribute_values(&row.gender) {
        product.add_attribute("Geslacht", &value);
    }
    match config.condition_label(&row.condition_rating) {
        Some(label) => product.add_attribute("Conditie", label),
        None if !row.condition_rating.trim().is_empty() => {
            warn!(
                rating = row.condition_rating.trim(),
                "unknown condition rating, attribute skipped"
            );
        }
        None => {}
    }
    if let Some(brand) = brand {
        product.add_attribute(BRAND_ATTRIBUTE, &brand.value_name);
    }
}

/// Apply the legacy commission column to the owning submission and the
/// customer's payout preference. The submission payout is a set-once
/// contract: the migration default may be replaced exactly once; later
/// conflicting values are logged and ignored.
pub fn apply_commission<S>(
    store: &mut S,
    submission: &mut Submission,
    raw: &str,
) -> cmig_model::Result<()>
where
    S: SubmissionRepo + CustomerRepo,
{
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "nan" {
        return Ok(());
    }
    let Ok(parsed) = trimmed.replace(',', ".").parse::<f64>() else {
        return Ok(());
    };
    let method = match parsed as i64 {
        30 => cmig_model::PayoutMethod::Cash,
        50 => cmig_model::PayoutMethod::Coupon,
        _ => return Ok(()),
    };
    let percentage = method.default_percentage();

    if submission.payout_contracted {
        if submission.payout_method != method {
            warn!(
                submission = %submission.name,
                contracted = %submission.payout_method,
                requested = %method,
                "conflicting commission after payout contract, ignored"
            );
        }
    } else {
        submission.payout_method = method;
        submission.payout_percentage = percentage;
        submission.payout_contracted = true;
        store.update_submission(submission)?;
    }

    if let Some(mut customer) = store.get_customer(submission.customer_id)
        && customer.payout_method != Some(method)
    {
        customer.payout_method = Some(method);
        customer.payout_percentage = Some(percentage);
        store.update_customer(&customer)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multi_value_fields_split_per_value() {
        assert_eq!(split_attribute_values("86/92"), vec!["86", "92"]);
        assert_eq!(
            split_attribute_values("Lente & Zomer"),
            vec!["Lente", "Zomer"]
        );
        assert_eq!(
            split_attribute_values("Herfst en Winter"),
            vec!["Herfst", "Winter"]
        );
        assert_eq!(split_attribute_values("98 | 104"), vec!["98", "104"]);
        assert!(split_attribute_values("").is_empty());
        assert_eq!(split_attribute_values("104"), vec!["104"]);
    }

    #[test]
    fn gift_card_rows_are_recognized() {
        assert!(is_gift_card_name("Kadobon 25 euro"));
        assert!(is_gift_card_name("CADEAUBON"));
        assert!(is_gift_card_name("giftcard"));
        assert!(!is_gift_card_name("Rode trui"));
    }
}
