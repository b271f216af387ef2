//! Read-only views of the entities this core consumes but does not own.

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use uuid::Uuid;

use super::geo::Coordinates;

#[derive(Debug, Clone, PartialEq)]
pub struct Address {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    pub is_active: bool,
}

impl Address {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PromotionKind {
    /// Percentage off the base price, e.g. `10` for 10%.
    Percentage(BigDecimal),
    /// Flat amount off the base price.
    FixedAmount(BigDecimal),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Promotion {
    pub id: Uuid,
    pub name: String,
    pub kind: PromotionKind,
    pub is_active: bool,
    pub starts_on: NaiveDate,
    pub ends_on: NaiveDate,
}

impl Promotion {
    /// Active and `today` falls inside the inclusive date range.
    pub fn is_current(&self, today: NaiveDate) -> bool {
        self.is_active && self.starts_on <= today && today <= self.ends_on
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub base_price: BigDecimal,
    pub is_paused: bool,
    pub promotions: Vec<Promotion>,
}
