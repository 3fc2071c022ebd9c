//! In-memory implementation of the commerce store contract.
//!
//! Backs the CLI run and the test suite. Unique-key semantics match the
//! production platform: email (case-insensitive), legacy ids, internal
//! product code, order reference, and voucher code each map to at most one
//! record.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::brand::{Brand, NewBrand};
use crate::category::{InternalCategory, PublicCategory};
use crate::customer::{Customer, NewCustomer};
use crate::error::{Result, StoreError};
use crate::ids::{
    BrandId, CategoryId, CustomerId, LegacyId, OrderId, ProductId, SubmissionId, VoucherId,
};
use crate::order::{NewOrder, Order};
use crate::product::{NewProduct, Product};
use crate::repository::{
    BrandRepo, CategoryRepo, CustomerRepo, OrderRepo, Persistence, ProductRepo, SubmissionRepo,
    VoucherRepo,
};
use crate::submission::{NewSubmission, Submission};
use crate::voucher::{NewVoucher, Voucher};

#[derive(Debug, Default)]
pub struct MemoryStore {
    customers: BTreeMap<u32, Customer>,
    customers_by_email: HashMap<String, CustomerId>,
    customers_by_legacy: HashMap<String, CustomerId>,
    submissions: BTreeMap<u32, Submission>,
    submissions_by_legacy: HashMap<String, SubmissionId>,
    brands: BTreeMap<u32, Brand>,
    brands_by_name: HashMap<String, BrandId>,
    public_categories: BTreeMap<u32, PublicCategory>,
    internal_categories: BTreeMap<u32, InternalCategory>,
    products: BTreeMap<u32, Product>,
    products_by_legacy: HashMap<String, ProductId>,
    products_by_code: HashMap<String, ProductId>,
    orders: BTreeMap<u32, Order>,
    orders_by_reference: HashMap<String, OrderId>,
    vouchers: BTreeMap<u32, Voucher>,
    vouchers_by_code: HashMap<String, VoucherId>,
    next_id: u32,
    checkpoints: usize,
}

/// Serializable view over the whole store, used by the CLI export.
#[derive(Debug, Serialize)]
pub struct StoreSnapshot {
    pub customers: Vec<Customer>,
    pub submissions: Vec<Submission>,
    pub brands: Vec<Brand>,
    pub public_categories: Vec<PublicCategory>,
    pub internal_categories: Vec<InternalCategory>,
    pub products: Vec<Product>,
    pub orders: Vec<Order>,
    pub vouchers: Vec<Voucher>,
}

fn email_key(email: &str) -> String {
    email.trim().to_lowercase()
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    /// Number of checkpoints requested so far (durability is a no-op in
    /// memory; the counter makes checkpoint cadence observable in tests).
    pub fn checkpoint_count(&self) -> usize {
        self.checkpoints
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            customers: self.customers.values().cloned().collect(),
            submissions: self.submissions.values().cloned().collect(),
            brands: self.brands.values().cloned().collect(),
            public_categories: self.public_categories.values().cloned().collect(),
            internal_categories: self.internal_categories.values().cloned().collect(),
            products: self.products.values().cloned().collect(),
            orders: self.orders.values().cloned().collect(),
            vouchers: self.vouchers.values().cloned().collect(),
        }
    }
}

impl CustomerRepo for MemoryStore {
    fn find_customer_by_email(&self, email: &str) -> Option<Customer> {
        self.customers_by_email
            .get(&email_key(email))
            .and_then(|id| self.customers.get(&id.0).cloned())
    }

    fn find_customer_by_legacy_id(&self, legacy_id: &LegacyId) -> Option<Customer> {
        self.customers_by_legacy
            .get(legacy_id.as_str())
            .and_then(|id| self.customers.get(&id.0).cloned())
    }

    fn find_customer_by_name(&self, name: &str) -> Option<Customer> {
        self.customers
            .values()
            .find(|customer| customer.name == name)
            .cloned()
    }

    fn get_customer(&self, id: CustomerId) -> Option<Customer> {
        self.customers.get(&id.0).cloned()
    }

    fn insert_customer(&mut self, new: NewCustomer) -> Result<Customer> {
        let key = email_key(&new.email);
        if self.customers_by_email.contains_key(&key) {
            return Err(StoreError::duplicate("customer", new.email));
        }
        if let Some(legacy) = &new.legacy_id
            && self.customers_by_legacy.contains_key(legacy.as_str())
        {
            return Err(StoreError::duplicate("customer", legacy.as_str()));
        }
        let id = CustomerId(self.alloc());
        let customer = Customer {
            id,
            legacy_id: new.legacy_id,
            email: new.email,
            name: new.name,
            street: new.street,
            street2: new.street2,
            zip: new.zip,
            city: new.city,
            bank_accounts: Vec::new(),
            payout_method: None,
            payout_percentage: None,
            note: new.note,
        };
        self.customers_by_email.insert(key, id);
        if let Some(legacy) = &customer.legacy_id {
            self.customers_by_legacy
                .insert(legacy.as_str().to_string(), id);
        }
        self.customers.insert(id.0, customer.clone());
        Ok(customer)
    }

    fn update_customer(&mut self, customer: &Customer) -> Result<()> {
        let Some(existing) = self.customers.get(&customer.id.0).cloned() else {
            return Err(StoreError::missing("customer", customer.id.0));
        };
        // Check every unique key before touching any index.
        let new_key = email_key(&customer.email);
        if let Some(other) = self.customers_by_email.get(&new_key)
            && *other != customer.id
        {
            return Err(StoreError::duplicate("customer", customer.email.clone()));
        }
        if let Some(legacy) = &customer.legacy_id
            && let Some(other) = self.customers_by_legacy.get(legacy.as_str())
            && *other != customer.id
        {
            return Err(StoreError::duplicate("customer", legacy.as_str()));
        }
        self.customers_by_email.remove(&email_key(&existing.email));
        self.customers_by_email.insert(new_key, customer.id);
        if let Some(legacy) = &existing.legacy_id {
            self.customers_by_legacy.remove(legacy.as_str());
        }
        if let Some(legacy) = &customer.legacy_id {
            self.customers_by_legacy
                .insert(legacy.as_str().to_string(), customer.id);
        }
        self.customers.insert(customer.id.0, customer.clone());
        Ok(())
    }

    fn add_bank_account(&mut self, id: CustomerId, iban: &str) -> Result<bool> {
        let Some(customer) = self.customers.get_mut(&id.0) else {
            return Err(StoreError::missing("customer", id.0));
        };
        if customer.has_bank_account(iban) {
            return Ok(false);
        }
        customer.bank_accounts.push(iban.to_string());
        Ok(true)
    }

    fn customer_count(&self) -> usize {
        self.customers.len()
    }
}

impl SubmissionRepo for MemoryStore {
    fn find_submission_by_legacy_id(&self, legacy_id: &LegacyId) -> Option<Submission> {
        self.submissions_by_legacy
            .get(legacy_id.as_str())
            .and_then(|id| self.submissions.get(&id.0).cloned())
    }

    fn find_submission_by_name(&self, name: &str) -> Option<Submission> {
        self.submissions
            .values()
            .find(|submission| submission.name == name)
            .cloned()
    }

    fn get_submission(&self, id: SubmissionId) -> Option<Submission> {
        self.submissions.get(&id.0).cloned()
    }

    fn insert_submission(&mut self, new: NewSubmission) -> Result<Submission> {
        if let Some(legacy) = &new.legacy_id
            && self.submissions_by_legacy.contains_key(legacy.as_str())
        {
            return Err(StoreError::duplicate("submission", legacy.as_str()));
        }
        let id = SubmissionId(self.alloc());
        let submission = Submission {
            id,
            name: new.name,
            legacy_id: new.legacy_id,
            legacy_code: new.legacy_code,
            customer_id: new.customer_id,
            received_date: new.received_date,
            published_date: new.published_date,
            payout_method: new.payout_method,
            payout_percentage: new.payout_percentage,
            payout_contracted: false,
            action_unsold: new.action_unsold,
            iban: new.iban,
            notes: new.notes,
        };
        if let Some(legacy) = &submission.legacy_id {
            self.submissions_by_legacy
                .insert(legacy.as_str().to_string(), id);
        }
        self.submissions.insert(id.0, submission.clone());
        Ok(submission)
    }

    fn update_submission(&mut self, submission: &Submission) -> Result<()> {
        if !self.submissions.contains_key(&submission.id.0) {
            return Err(StoreError::missing("submission", submission.id.0));
        }
        self.submissions.insert(submission.id.0, submission.clone());
        Ok(())
    }

    fn submission_count(&self) -> usize {
        self.submissions.len()
    }
}

impl BrandRepo for MemoryStore {
    fn find_brand_by_name(&self, name: &str) -> Option<Brand> {
        self.brands_by_name
            .get(name)
            .and_then(|id| self.brands.get(&id.0).cloned())
    }

    fn get_brand(&self, id: BrandId) -> Option<Brand> {
        self.brands.get(&id.0).cloned()
    }

    fn insert_brand(&mut self, new: NewBrand) -> Result<Brand> {
        if self.brands_by_name.contains_key(&new.name) {
            return Err(StoreError::duplicate("brand", new.name));
        }
        let id = BrandId(self.alloc());
        let brand = Brand {
            id,
            name: new.name,
            published: new.published,
            description: new.description,
            seo_title: new.seo_title,
            seo_description: new.seo_description,
            seo_keywords: new.seo_keywords,
            logo: new.logo,
        };
        self.brands_by_name.insert(brand.name.clone(), id);
        self.brands.insert(id.0, brand.clone());
        Ok(brand)
    }

    fn update_brand(&mut self, brand: &Brand) -> Result<()> {
        let Some(existing) = self.brands.get(&brand.id.0).cloned() else {
            return Err(StoreError::missing("brand", brand.id.0));
        };
        if let Some(other) = self.brands_by_name.get(&brand.name)
            && *other != brand.id
        {
            return Err(StoreError::duplicate("brand", brand.name.clone()));
        }
        self.brands_by_name.remove(&existing.name);
        self.brands_by_name.insert(brand.name.clone(), brand.id);
        self.brands.insert(brand.id.0, brand.clone());
        Ok(())
    }

    fn brand_count(&self) -> usize {
        self.brands.len()
    }
}

impl CategoryRepo for MemoryStore {
    fn find_public_category(
        &self,
        name: &str,
        parent: Option<CategoryId>,
    ) -> Option<PublicCategory> {
        self.public_categories
            .values()
            .find(|category| category.name == name && category.parent == parent)
            .cloned()
    }

    fn insert_public_category(
        &mut self,
        name: &str,
        parent: Option<CategoryId>,
    ) -> Result<PublicCategory> {
        let id = CategoryId(self.alloc());
        let category = PublicCategory {
            id,
            name: name.to_string(),
            parent,
            linked_type_value: None,
        };
        self.public_categories.insert(id.0, category.clone());
        Ok(category)
    }

    fn update_public_category(&mut self, category: &PublicCategory) -> Result<()> {
        if !self.public_categories.contains_key(&category.id.0) {
            return Err(StoreError::missing("public category", category.id.0));
        }
        self.public_categories.insert(category.id.0, category.clone());
        Ok(())
    }

    fn find_internal_category(&self, name: &str) -> Option<InternalCategory> {
        self.internal_categories
            .values()
            .find(|category| category.name == name)
            .cloned()
    }

    fn insert_internal_category(&mut self, name: &str) -> Result<InternalCategory> {
        let id = CategoryId(self.alloc());
        let category = InternalCategory {
            id,
            name: name.to_string(),
        };
        self.internal_categories.insert(id.0, category.clone());
        Ok(category)
    }
}

impl ProductRepo for MemoryStore {
    fn find_product_by_legacy_id(&self, legacy_id: &LegacyId) -> Option<Product> {
        self.products_by_legacy
            .get(legacy_id.as_str())
            .and_then(|id| self.products.get(&id.0).cloned())
    }

    fn find_product_by_code(&self, code: &str) -> Option<Product> {
        self.products_by_code
            .get(code)
            .and_then(|id| self.products.get(&id.0).cloned())
    }

    fn get_product(&self, id: ProductId) -> Option<Product> {
        self.products.get(&id.0).cloned()
    }

    fn insert_product(&mut self, new: NewProduct) -> Result<Product> {
        if let Some(legacy) = &new.legacy_id
            && self.products_by_legacy.contains_key(legacy.as_str())
        {
            return Err(StoreError::duplicate("product", legacy.as_str()));
        }
        if let Some(code) = &new.default_code
            && self.products_by_code.contains_key(code)
        {
            return Err(StoreError::duplicate("product", code.clone()));
        }
        let id = ProductId(self.alloc());
        let product = Product {
            id,
            legacy_id: new.legacy_id,
            default_code: new.default_code,
            name: new.name,
            list_price: new.list_price,
            submission_id: new.submission_id,
            stock: 0.0,
            published: false,
            brand_id: new.brand_id,
            public_category_id: new.public_category_id,
            internal_category_id: new.internal_category_id,
            attributes: Vec::new(),
            unsold_reason: None,
            description: None,
            description_ecommerce: new.description_ecommerce,
            seo_title: new.seo_title,
            seo_description: new.seo_description,
            seo_keywords: new.seo_keywords,
            image: new.image,
        };
        if let Some(legacy) = &product.legacy_id {
            self.products_by_legacy
                .insert(legacy.as_str().to_string(), id);
        }
        if let Some(code) = &product.default_code {
            self.products_by_code.insert(code.clone(), id);
        }
        self.products.insert(id.0, product.clone());
        Ok(product)
    }

    fn update_product(&mut self, product: &Product) -> Result<()> {
        let Some(existing) = self.products.get(&product.id.0).cloned() else {
            return Err(StoreError::missing("product", product.id.0));
        };
        // Check every unique key before touching any index.
        if let Some(legacy) = &product.legacy_id
            && let Some(other) = self.products_by_legacy.get(legacy.as_str())
            && *other != product.id
        {
            return Err(StoreError::duplicate("product", legacy.as_str()));
        }
        if let Some(code) = &product.default_code
            && let Some(other) = self.products_by_code.get(code)
            && *other != product.id
        {
            return Err(StoreError::duplicate("product", code.clone()));
        }
        if let Some(legacy) = &existing.legacy_id {
            self.products_by_legacy.remove(legacy.as_str());
        }
        if let Some(code) = &existing.default_code {
            self.products_by_code.remove(code);
        }
        if let Some(legacy) = &product.legacy_id {
            self.products_by_legacy
                .insert(legacy.as_str().to_string(), product.id);
        }
        if let Some(code) = &product.default_code {
            self.products_by_code.insert(code.clone(), product.id);
        }
        self.products.insert(product.id.0, product.clone());
        Ok(())
    }

    fn products_in_submission(&self, id: SubmissionId) -> usize {
        self.products
            .values()
            .filter(|product| product.submission_id == id)
            .count()
    }

    fn product_count(&self) -> usize {
        self.products.len()
    }
}

impl OrderRepo for MemoryStore {
    fn find_order_by_reference(&self, reference: &str) -> Option<Order> {
        self.orders_by_reference
            .get(reference)
            .and_then(|id| self.orders.get(&id.0).cloned())
    }

    fn insert_order(&mut self, new: NewOrder) -> Result<Order> {
        if self.orders_by_reference.contains_key(&new.reference) {
            return Err(StoreError::duplicate("order", new.reference));
        }
        let id = OrderId(self.alloc());
        let order = Order {
            id,
            reference: new.reference,
            customer_id: new.customer_id,
            date_order: new.date_order,
            origin: new.origin,
            state: new.state,
            lines: new.lines,
        };
        self.orders_by_reference.insert(order.reference.clone(), id);
        self.orders.insert(id.0, order.clone());
        Ok(order)
    }

    fn order_count(&self) -> usize {
        self.orders.len()
    }
}

impl VoucherRepo for MemoryStore {
    fn find_voucher_by_code(&self, code: &str) -> Option<Voucher> {
        self.vouchers_by_code
            .get(code)
            .and_then(|id| self.vouchers.get(&id.0).cloned())
    }

    fn insert_voucher(&mut self, new: NewVoucher) -> Result<Voucher> {
        if self.vouchers_by_code.contains_key(&new.code) {
            return Err(StoreError::duplicate("voucher", new.code));
        }
        let id = VoucherId(self.alloc());
        let voucher = Voucher {
            id,
            code: new.code,
            kind: new.kind,
            expires: new.expires,
        };
        self.vouchers_by_code.insert(voucher.code.clone(), id);
        self.vouchers.insert(id.0, voucher.clone());
        Ok(voucher)
    }

    fn voucher_count(&self) -> usize {
        self.vouchers.len()
    }
}

impl Persistence for MemoryStore {
    fn checkpoint(&mut self) -> Result<()> {
        self.checkpoints += 1;
        Ok(())
    }
}
