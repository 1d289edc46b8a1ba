//! Wishlist Aggregate

use uuid::Uuid;

use crate::domain::value_objects::UserId;

#[derive(Clone, Debug)]
pub struct Wishlist {
    user: UserId,
    product_ids: Vec<Uuid>,
}

impl Wishlist {
    pub fn for_user(user: UserId) -> Self { Self { user, product_ids: vec![] } }
    pub fn user(&self) -> UserId { self.user }
    pub fn product_ids(&self) -> &[Uuid] { &self.product_ids }
    pub fn contains(&self, product_id: Uuid) -> bool { self.product_ids.contains(&product_id) }

    pub fn add(&mut self, product_id: Uuid) {
        if !self.contains(product_id) { self.product_ids.push(product_id); }
    }

    pub fn remove(&mut self, product_id: Uuid) { self.product_ids.retain(|id| *id != product_id); }
}
