//! Repository contract of the commerce store.
//!
//! The migration engine never talks to a concrete persistence layer; it is
//! generic over these traits. Every find-or-create decision in the engine
//! is an explicit lookup followed by an explicit insert, and all unique
//! keys (email, legacy id, internal code, order reference, voucher code)
//! are enforced by the implementation.

use crate::brand::{Brand, NewBrand};
use crate::category::{InternalCategory, PublicCategory};
use crate::customer::{Customer, NewCustomer};
use crate::error::Result;
use crate::ids::{BrandId, CategoryId, CustomerId, LegacyId, ProductId, SubmissionId};
use crate::order::{NewOrder, Order};
use crate::product::{NewProduct, Product};
use crate::submission::{NewSubmission, Submission};
use crate::voucher::{NewVoucher, Voucher};

pub trait CustomerRepo {
    fn find_customer_by_email(&self, email: &str) -> Option<Customer>;
    fn find_customer_by_legacy_id(&self, legacy_id: &LegacyId) -> Option<Customer>;
    fn find_customer_by_name(&self, name: &str) -> Option<Customer>;
    fn get_customer(&self, id: CustomerId) -> Option<Customer>;
    fn insert_customer(&mut self, new: NewCustomer) -> Result<Customer>;
    fn update_customer(&mut self, customer: &Customer) -> Result<()>;
    /// Attach an IBAN unless the customer already holds an identical one.
    /// Returns whether the account was added.
    fn add_bank_account(&mut self, id: CustomerId, iban: &str) -> Result<bool>;
    fn customer_count(&self) -> usize;
}

pub trait SubmissionRepo {
    fn find_submission_by_legacy_id(&self, legacy_id: &LegacyId) -> Option<Submission>;
    fn find_submission_by_name(&self, name: &str) -> Option<Submission>;
    fn get_submission(&self, id: SubmissionId) -> Option<Submission>;
    fn insert_submission(&mut self, new: NewSubmission) -> Result<Submission>;
    fn update_submission(&mut self, submission: &Submission) -> Result<()>;
    fn submission_count(&self) -> usize;
}

pub trait BrandRepo {
    fn find_brand_by_name(&self, name: &str) -> Option<Brand>;
    fn get_brand(&self, id: BrandId) -> Option<Brand>;
    fn insert_brand(&mut self, new: NewBrand) -> Result<Brand>;
    fn update_brand(&mut self, brand: &Brand) -> Result<()>;
    fn brand_count(&self) -> usize;
}

pub trait CategoryRepo {
    fn find_public_category(&self, name: &str, parent: Option<CategoryId>)
    -> Option<PublicCategory>;
    fn insert_public_category(
        &mut self,
        name: &str,
        parent: Option<CategoryId>,
    ) -> Result<PublicCategory>;
    fn update_public_category(&mut self, category: &PublicCategory) -> Result<()>;
    fn find_internal_category(&self, name: &str) -> Option<InternalCategory>;
    fn insert_internal_category(&mut self, name: &str) -> Result<InternalCategory>;
}

pub trait ProductRepo {
    fn find_product_by_legacy_id(&self, legacy_id: &LegacyId) -> Option<Product>;
    fn find_product_by_code(&self, code: &str) -> Option<Product>;
    fn get_product(&self, id: ProductId) -> Option<Product>;
    fn insert_product(&mut self, new: NewProduct) -> Result<Product>;
    fn update_product(&mut self, product: &Product) -> Result<()>;
    /// Number of products currently attached to a submission; feeds
    /// default-code generation.
    fn products_in_submission(&self, id: SubmissionId) -> usize;
    fn product_count(&self) -> usize;
}

pub trait OrderRepo {
    fn find_order_by_reference(&self, reference: &str) -> Option<Order>;
    fn insert_order(&mut self, new: NewOrder) -> Result<Order>;
    fn order_count(&self) -> usize;
}

pub trait VoucherRepo {
    fn find_voucher_by_code(&self, code: &str) -> Option<Voucher>;
    fn insert_voucher(&mut self, new: NewVoucher) -> Result<Voucher>;
    fn voucher_count(&self) -> usize;
}

/// Durability hook. A checkpoint makes everything written so far survive a
/// crash; correctness never depends on it because every write is keyed for
/// idempotent re-application.
pub trait Persistence {
    fn checkpoint(&mut self) -> Result<()>;
}

/// The full store contract the migration run is generic over.
pub trait CommerceStore:
    CustomerRepo
    + SubmissionRepo
    + BrandRepo
    + CategoryRepo
    + ProductRepo
    + OrderRepo
    + VoucherRepo
    + Persistence
{
}

impl<T> CommerceStore for T where
    T: CustomerRepo
        + SubmissionRepo
        + BrandRepo
        + CategoryRepo
        + ProductRepo
        + OrderRepo
        + VoucherRepo
        + Persistence
{
}
