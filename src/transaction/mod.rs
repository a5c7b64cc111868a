//! Transactions record money earned or spent by a user.
//!
//! This module contains:
//! - The `Transaction` model and `TransactionBuilder` for creating transactions
//! - Database functions for storing, querying, and deleting transactions
//! - The pages and endpoints for listing, creating and deleting transactions
//! - Adding a category from the new transaction form

mod category_picker;
mod core;
mod create_endpoint;
mod create_page;
mod delete_endpoint;
mod transactions_page;

pub use category_picker::create_quick_category_endpoint;
pub use core::{
    Transaction, TransactionBuilder, TransactionId, TransactionType, count_transactions,
    create_transaction, create_transaction_table, delete_transaction, get_transaction,
    get_user_transactions,
};
pub use create_endpoint::create_transaction_endpoint;
pub use create_page::get_create_transaction_page;
pub use delete_endpoint::delete_transaction_endpoint;
pub use transactions_page::get_transactions_page;
