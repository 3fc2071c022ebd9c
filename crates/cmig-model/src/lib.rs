pub mod brand;
pub mod category;
pub mod customer;
pub mod enums;
pub mod error;
pub mod ids;
pub mod memory;
pub mod order;
pub mod product;
pub mod repository;
pub mod submission;
pub mod voucher;

pub use brand::{Brand, NewBrand};
pub use category::{InternalCategory, PublicCategory};
pub use customer::{Customer, NewCustomer};
pub use enums::{OrderState, PayoutMethod, ReturnAction, UnsoldReason};
pub use error::{Result, StoreError};
pub use ids::{
    BrandId, CategoryId, CustomerId, LegacyId, OrderId, ProductId, SubmissionId, VoucherId,
};
pub use memory::{MemoryStore, StoreSnapshot};
pub use order::{NewOrder, Order, OrderLine};
pub use product::{AttributeLine, NewProduct, Product};
pub use repository::{
    BrandRepo, CategoryRepo, CommerceStore, CustomerRepo, OrderRepo, Persistence, ProductRepo,
    SubmissionRepo, VoucherRepo,
};
pub use submission::{NewSubmission, Submission};
pub use voucher::{NewVoucher, Voucher, VoucherKind};
