//! OpenSASE Storefront
//!
//! Cart, checkout and order pipeline for a multi-seller storefront.
//!
//! ## Features
//! - Product catalog with seller-managed listings
//! - Per-user cart and wishlist
//! - Server-side pricing with a single shipping rule
//! - Atomic cart-to-order checkout
//! - Order history and status lifecycle

pub mod api;
pub mod config;
pub mod domain;
pub mod pricing;
pub mod publisher;
pub mod services;
pub mod store;


use thiserror::Error;

use crate::domain::aggregates::OrderStatus;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum ShopError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0} belongs to another user")]
    Forbidden(&'static str),

    #[error("cart is empty")]
    EmptyCart,

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("malformed request: {0}")]
    BadRequest(String),

    #[error("cart already holds products from another seller")]
    SellerMismatch,

    #[error("insufficient stock for {0}")]
    InsufficientStock(String),

    #[error("cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("{0} already exists")]
    AlreadyExists(&'static str),

    #[error("storage error")]
    Storage(#[source] sqlx::Error),
}

impl ShopError {
    /// Conflicts are requests that were well-formed but collide with current state.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::SellerMismatch
                | Self::InsufficientStock(_)
                | Self::InvalidTransition { .. }
                | Self::AlreadyExists(_)
        )
    }
}

impl From<sqlx::Error> for ShopError {
    fn from(error: sqlx::Error) -> Self {
        if matches!(error, sqlx::Error::RowNotFound) {
            return Self::NotFound("record");
        }

        match error.as_database_error() {
            Some(db) if db.is_unique_violation() => Self::AlreadyExists("record"),
            Some(db) if db.is_check_violation() => Self::Validation(db.message().to_string()),
            // string_data_right_truncation, numeric_value_out_of_range
            Some(db) if matches!(db.code().as_deref(), Some("22001" | "22003")) => {
                Self::Validation(db.message().to_string())
            }
            _ => Self::Storage(error),
        }
    }
}

impl From<validator::ValidationErrors> for ShopError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ShopError>;
