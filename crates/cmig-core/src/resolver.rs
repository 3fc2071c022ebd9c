//! Find-or-create resolution of customers, submissions, brands, and
//! categories, with caches scoped to one migration run.
//!
//! The caches map legacy ids to store ids so a multi-hundred-thousand-row
//! run never creates the same entity twice and rarely hits the store for a
//! lookup it already answered.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use tracing::{debug, info};

use cmig_model::{
    BrandId, BrandRepo, CategoryId, CategoryRepo, Customer, CustomerId, CustomerRepo, LegacyId,
    NewBrand, NewCustomer, NewSubmission, PayoutMethod, ReturnAction, SubmissionId, SubmissionRepo,
};

use crate::config::MigrationConfig;

/// Legacy-brand resolution result: the brand record plus the attribute
/// value name used for faceted filtering.
#[derive(Debug, Clone)]
pub struct BrandRef {
    pub brand_id: BrandId,
    pub value_name: String,
}

/// Resolved category pair for one legacy label.
#[derive(Debug, Clone)]
pub struct CategorySlot {
    pub public_id: CategoryId,
    pub internal_id: CategoryId,
    /// Shoe categories use the `Schoenmaat` size attribute.
    pub is_shoe: bool,
}

/// Per-run lookup caches, keyed by legacy id (or label for categories).
/// Populated lazily, never invalidated mid-run, dropped with the run.
#[derive(Debug, Default)]
pub struct RunCaches {
    pub customers: HashMap<String, CustomerId>,
    pub submissions: HashMap<String, SubmissionId>,
    pub brands: HashMap<String, BrandRef>,
    pub categories: HashMap<String, CategorySlot>,
}

/// Address-ish fields of a customer row; empty strings mean "not in this
/// export" and never blank an already-populated field.
#[derive(Debug, Clone, Default)]
pub struct CustomerFields {
    pub name: String,
    pub street: String,
    pub street2: String,
    pub zip: String,
    pub city: String,
}

fn patch(target: &mut Option<String>, value: &str) -> bool {
    if value.is_empty() {
        return false;
    }
    if target.as_deref() == Some(value) {
        return false;
    }
    *target = Some(value.to_string());
    true
}

/// Find a customer by email or legacy id, patching non-empty fields in
/// place; create when absent. Returns the customer and whether it was
/// created.
pub fn find_or_create_customer<S>(
    store: &mut S,
    legacy_id: &LegacyId,
    email: &str,
    fields: &CustomerFields,
) -> cmig_model::Result<(Customer, bool)>
where
    S: CustomerRepo,
{
    let existing = store
        .find_customer_by_email(email)
        .or_else(|| store.find_customer_by_legacy_id(legacy_id));

    if let Some(mut customer) = existing {
        let mut dirty = false;
        if customer.legacy_id.is_none() {
            customer.legacy_id = Some(legacy_id.clone());
            dirty = true;
        }
        if !fields.name.is_empty() && customer.name != fields.name {
            customer.name = fields.name.clone();
            dirty = true;
        }
        dirty |= patch(&mut customer.street, &fields.street);
        dirty |= patch(&mut customer.street2, &fields.street2);
        dirty |= patch(&mut customer.zip, &fields.zip);
        dirty |= patch(&mut customer.city, &fields.city);
        if dirty {
            store.update_customer(&customer)?;
        }
        return Ok((customer, false));
    }

    let name = if fields.name.is_empty() {
        email.to_string()
    } else {
        fields.name.clone()
    };
    let customer = store.insert_customer(NewCustomer {
        legacy_id: Some(legacy_id.clone()),
        email: email.to_string(),
        name,
        street: non_empty(&fields.street),
        street2: non_empty(&fields.street2),
        zip: non_empty(&fields.zip),
        city: non_empty(&fields.city),
        note: None,
    })?;
    Ok((customer, true))
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Compute the received/published dates of a submission from the two
/// legacy dates under the exact fallback ladder. Returns the pair plus
/// whether the year-code fallback was used.
pub fn submission_dates(
    sent: Option<NaiveDate>,
    received: Option<NaiveDate>,
    legacy_code: &str,
    today: NaiveDate,
) -> (NaiveDate, NaiveDate, bool) {
    match (sent, received) {
        (Some(sent), Some(received)) => (sent, received, false),
        (Some(sent), None) => (sent, sent, false),
        (None, Some(received)) => (received, received, false),
        (None, None) => {
            let code = legacy_code.trim();
            let year = code
                .get(..4)
                .filter(|prefix| prefix.chars().all(|ch| ch.is_ascii_digit()))
                .and_then(|prefix| prefix.parse::<i32>().ok())
                .unwrap_or_else(|| today.year());
            let fallback = NaiveDate::from_ymd_opt(year, 7, 1).unwrap_or(today);
            (fallback, fallback, true)
        }
    }
}

/// Everything needed to create a submission that is not already derived
/// from the store.
#[derive(Debug, Clone)]
pub struct SubmissionSeed {
    pub legacy_id: LegacyId,
    pub legacy_code: String,
    pub customer_id: CustomerId,
    pub sent_date: Option<NaiveDate>,
    pub received_date: Option<NaiveDate>,
    pub action_unsold: ReturnAction,
    pub notes: Vec<String>,
}

/// Find a submission by legacy id or create it with computed dates and the
/// migration-default payout terms.
pub fn find_or_create_submission<S>(
    store: &mut S,
    seed: SubmissionSeed,
    today: NaiveDate,
) -> cmig_model::Result<(SubmissionId, bool)>
where
    S: SubmissionRepo + CustomerRepo,
{
    if let Some(existing) = store.find_submission_by_legacy_id(&seed.legacy_id) {
        return Ok((existing.id, false));
    }

    let (received_date, published_date, used_fallback) = submission_dates(
        seed.sent_date,
        seed.received_date,
        &seed.legacy_code,
        today,
    );
    if used_fallback {
        info!(
            bag = %seed.legacy_id,
            code = %seed.legacy_code,
            fallback = %received_date,
            "no dates on legacy bag, derived July 1st fallback from its code"
        );
    }

    let iban = store
        .get_customer(seed.customer_id)
        .and_then(|customer| customer.bank_accounts.first().cloned());
    let name = if seed.legacy_code.trim().is_empty() {
        format!("BAG-{}", seed.legacy_id)
    } else {
        seed.legacy_code.trim().to_string()
    };
    let submission = store.insert_submission(NewSubmission {
        name,
        legacy_id: Some(seed.legacy_id),
        legacy_code: non_empty(seed.legacy_code.trim()),
        customer_id: seed.customer_id,
        received_date,
        published_date,
        payout_method: PayoutMethod::Coupon,
        payout_percentage: PayoutMethod::Coupon.default_percentage(),
        action_unsold: seed.action_unsold,
        iban,
        notes: seed.notes,
    })?;
    Ok((submission.id, true))
}

/// Brand fields from the legacy export.
#[derive(Debug, Clone, Default)]
pub struct BrandSeed {
    pub name: String,
    pub description: String,
    pub seo_title: String,
    pub seo_description: String,
    pub seo_keywords: String,
    pub logo: Option<Vec<u8>>,
}

/// Find a brand by name and patch it, or create it published. The brand
/// name doubles as its filter attribute value.
pub fn upsert_brand<S>(store: &mut S, seed: BrandSeed) -> cmig_model::Result<(BrandRef, bool)>
where
    S: BrandRepo,
{
    if let Some(mut brand) = store.find_brand_by_name(&seed.name) {
        let mut dirty = patch(&mut brand.description, &seed.description);
        dirty |= patch(&mut brand.seo_title, &seed.seo_title);
        dirty |= patch(&mut brand.seo_description, &seed.seo_description);
        dirty |= patch(&mut brand.seo_keywords, &seed.seo_keywords);
        if !brand.published {
            brand.published = true;
            dirty = true;
        }
        if brand.logo.is_none() && seed.logo.is_some() {
            brand.logo = seed.logo;
            dirty = true;
        }
        if dirty {
            store.update_brand(&brand)?;
        }
        return Ok((
            BrandRef {
                brand_id: brand.id,
                value_name: brand.name,
            },
            false,
        ));
    }

    let brand = store.insert_brand(NewBrand {
        name: seed.name,
        published: true,
        description: non_empty(&seed.description),
        seo_title: non_empty(&seed.seo_title),
        seo_description: non_empty(&seed.seo_description),
        seo_keywords: non_empty(&seed.seo_keywords),
        logo: seed.logo,
    })?;
    Ok((
        BrandRef {
            value_name: brand.name,
            brand_id: brand.id,
        },
        true,
    ))
}

/// Resolve a legacy category label through the static mapping table,
/// creating missing path segments, the backend mirror node, and the
/// `Type` attribute link on demand.
pub fn ensure_category<S>(
    store: &mut S,
    caches: &mut RunCaches,
    config: &MigrationConfig,
    legacy_label: &str,
) -> cmig_model::Result<Option<CategorySlot>>
where
    S: CategoryRepo,
{
    let label = legacy_label.trim();
    if label.is_empty() {
        return Ok(None);
    }
    if let Some(slot) = caches.categories.get(label) {
        return Ok(Some(slot.clone()));
    }
    let Some(entry) = config.category_for(label) else {
        debug!(label, "legacy category not in mapping table");
        return Ok(None);
    };
    let path = entry.path.clone();
    let type_value = entry.type_value.clone();

    let mut parent: Option<CategoryId> = None;
    let mut leaf = None;
    for segment in path.split('/') {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        let node = match store.find_public_category(segment, parent) {
            Some(node) => node,
            None => store.insert_public_category(segment, parent)?,
        };
        parent = Some(node.id);
        leaf = Some(node);
    }
    let Some(mut leaf) = leaf else {
        return Ok(None);
    };
    if leaf.linked_type_value.as_deref() != Some(type_value.as_str()) {
        leaf.linked_type_value = Some(type_value);
        store.update_public_category(&leaf)?;
    }

    let internal = match store.find_internal_category(&leaf.name) {
        Some(existing) => existing,
        None => store.insert_internal_category(&leaf.name)?,
    };

    let slot = CategorySlot {
        public_id: leaf.id,
        internal_id: internal.id,
        is_shoe: path.contains("Schoenen"),
    };
    caches.categories.insert(label.to_string(), slot.clone());
    Ok(Some(slot))
}

/// Backend catch-all category for rows whose legacy label is unmapped.
pub fn ensure_fallback_internal<S>(store: &mut S) -> cmig_model::Result<CategoryId>
where
    S: CategoryRepo,
{
    match store.find_internal_category("All") {
        Some(existing) => Ok(existing.id),
        None => Ok(store.insert_internal_category("All")?.id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmig_model::MemoryStore;

    fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn date_ladder_both_known() {
        let (received, published, fallback) = submission_dates(
            Some(ymd(2021, 3, 1)),
            Some(ymd(2021, 3, 5)),
            "20210337",
            ymd(2026, 1, 1),
        );
        assert_eq!(received, ymd(2021, 3, 1));
        assert_eq!(published, ymd(2021, 3, 5));
        assert!(!fallback);
    }

    #[test]
    fn date_ladder_single_known_fills_both() {
        let (received, published, _) =
            submission_dates(Some(ymd(2021, 3, 1)), None, "", ymd(2026, 1, 1));
        assert_eq!(received, published);
        let (received, published, _) =
            submission_dates(None, Some(ymd(2021, 3, 5)), "", ymd(2026, 1, 1));
        assert_eq!(received, published);
        assert_eq!(received, ymd(2021, 3, 5));
    }

    #[test]
    fn date_ladder_falls_back_to_code_year() {
        let (received, _, fallback) = submission_dates(None, None, "20210337", ymd(2026, 2, 2));
        assert_eq!(received, ymd(2021, 7, 1));
        assert!(fallback);
    }

    #[test]
    fn date_ladder_falls_back_to_current_year_without_code() {
        let (received, _, fallback) = submission_dates(None, None, "ZAK-X", ymd(2026, 2, 2));
        assert_eq!(received, ymd(2026, 7, 1));
        assert!(fallback);
    }

    #[test]
    fn customer_is_patched_not_duplicated() {
        let mut store = MemoryStore::new();
        let legacy = LegacyId::new("41");
        let first = CustomerFields {
            name: "An Peeters".to_string(),
            street: "Dorpsstraat 1".to_string(),
            ..CustomerFields::default()
        };
        let (created, was_created) =
            find_or_create_customer(&mut store, &legacy, "an@example.com", &first).unwrap();
        assert!(was_created);

        let second = CustomerFields {
            name: "An Peeters".to_string(),
            street: "Nieuwstraat 7".to_string(),
            city: "Gent".to_string(),
            ..CustomerFields::default()
        };
        let (updated, was_created) =
            find_or_create_customer(&mut store, &legacy, "an@example.com", &second).unwrap();
        assert!(!was_created);
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.street.as_deref(), Some("Nieuwstraat 7"));
        assert_eq!(store.customer_count(), 1);
    }

    #[test]
    fn blank_fields_never_overwrite_populated_ones() {
        let mut store = MemoryStore::new();
        let legacy = LegacyId::new("42");
        let full = CustomerFields {
            name: "Bo".to_string(),
            city: "Leuven".to_string(),
            ..CustomerFields::default()
        };
        find_or_create_customer(&mut store, &legacy, "bo@example.com", &full).unwrap();
        let sparse = CustomerFields {
            name: "Bo".to_string(),
            ..CustomerFields::default()
        };
        let (customer, _) =
            find_or_create_customer(&mut store, &legacy, "bo@example.com", &sparse).unwrap();
        assert_eq!(customer.city.as_deref(), Some("Leuven"));
    }

    #[test]
    fn category_path_created_once_and_linked() {
        let mut store = MemoryStore::new();
        let mut caches = RunCaches::default();
        let config = MigrationConfig::default();
        let slot = ensure_category(&mut store, &mut caches, &config, "Schoenen")
            .unwrap()
            .expect("mapped");
        assert!(slot.is_shoe);
        let again = ensure_category(&mut store, &mut caches, &config, "Schoenen")
            .unwrap()
            .expect("mapped");
        assert_eq!(slot.public_id, again.public_id);
        let leaf = store
            .find_public_category("Schoenen", {
                let parent = store.find_public_category("Schoenen en Kousen", None).unwrap();
                Some(parent.id)
            })
            .expect("leaf exists");
        assert_eq!(leaf.linked_type_value.as_deref(), Some("Schoenen"));
    }

    #[test]
    fn unmapped_category_resolves_to_none() {
        let mut store = MemoryStore::new();
        let mut caches = RunCaches::default();
        let config = MigrationConfig::default();
        let slot = ensure_category(&mut store, &mut caches, &config, "Onbekend").unwrap();
        assert!(slot.is_none());
    }
}
