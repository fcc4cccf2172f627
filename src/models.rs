pub mod account;
pub mod auth;
pub mod category;
pub mod paging;
pub mod transaction;

pub use account::{Account, AccountDto, CreateAccountRequest};
pub use auth::{AuthenticationResult, CurrentUser, LoginRequest, RegisterRequest};
pub use category::{Category, CategoryDto, CategoryType, CreateCategoryRequest};
pub use paging::{PageRequest, PagedResult};
pub use transaction::{
    CreateTransactionRequest, Transaction, TransactionDto, TransactionFilter, TransactionQuery,
    TransactionType,
};
