//! Application services. Each one owns a handle to the shared store and
//! turns user requests into store operations plus pricing.

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod orders;
pub mod wishlist;

pub use cart::{CartService, CartSummary, CartTotals, ItemTotals};
pub use catalog::CatalogService;
pub use checkout::{CheckoutForm, CheckoutQuote, CheckoutService, CheckoutSource};
pub use orders::{OrderService, SellerDashboard};
pub use wishlist::WishlistService;
