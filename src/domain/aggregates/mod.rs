//! Aggregates module
pub mod product;
pub mod order;
pub mod cart;
pub mod wishlist;

pub use product::{Category, NewCategory, Product, ProductDraft, ProductQuery};
pub use order::{Order, OrderItem, OrderStatus, ParseEnumError, Payment, PaymentMethod, PaymentStatus, ShippingAddress};
pub use cart::{check_size, normalize_size, Cart, CartItem, CartLine, MAX_SIZE_LEN};
pub use wishlist::Wishlist;
