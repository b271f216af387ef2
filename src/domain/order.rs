use std::collections::BTreeMap;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::DomainError;
use super::pricing;
use super::status::{check_transition, OrderStatus};

pub const DEFAULT_CANCELLATION_REASON: &str = "Cancelado sem motivo informado";

#[derive(Debug, Clone, PartialEq)]
pub struct OrderLine {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    /// Promotion-adjusted price charged per unit.
    pub unit_price: BigDecimal,
    /// Price before the promotion; `None` when no promotion applied.
    pub original_price: Option<BigDecimal>,
    pub had_promotion: bool,
    pub promotion_name: Option<String>,
    pub subtotal: BigDecimal,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub delivery_address_id: Uuid,
    pub lines: Vec<OrderLine>,
    pub delivery_distance_km: f64,
    pub delivery_fee: BigDecimal,
    pub discount: Option<BigDecimal>,
    pub total: BigDecimal,
    pub status: OrderStatus,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn items_subtotal(&self) -> BigDecimal {
        pricing::order_total(self.lines.iter().map(|l| &l.subtotal), &BigDecimal::from(0), None)
    }

    /// Moves the order to `target`. On error the order is left untouched.
    ///
    /// Cancelling records `reason`, or a generic one when none is given.
    pub fn transition(
        &mut self,
        target: OrderStatus,
        reason: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        check_transition(self.status, target)?;

        if target == OrderStatus::Cancelado {
            self.cancellation_reason =
                Some(reason.unwrap_or_else(|| DEFAULT_CANCELLATION_REASON.to_string()));
        }
        self.status = target;
        self.updated_at = at;
        Ok(())
    }
}

/// Returned instead of an order when the address is outside the delivery radius.
#[derive(Debug, Clone, PartialEq)]
pub struct PartnerRedirect {
    pub distance_km: f64,
    pub partner_links: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OrderResult {
    Placed(Order),
    RedirectToPartners(PartnerRedirect),
}

#[derive(Debug, Clone)]
pub struct OrderItemRequest {
    pub product_id: Uuid,
    pub quantity: i32,
    pub note: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub address_id: Uuid,
    pub items: Vec<OrderItemRequest>,
    pub discount: Option<BigDecimal>,
}

impl PlaceOrder {
    /// Shape checks that need no collaborator.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.items.is_empty() {
            return Err(DomainError::InvalidInput(
                "an order needs at least one item".to_string(),
            ));
        }
        if let Some(item) = self.items.iter().find(|i| i.quantity < 1) {
            return Err(DomainError::InvalidInput(format!(
                "quantity for product {} must be at least 1 (got {})",
                item.product_id, item.quantity
            )));
        }
        if let Some(discount) = &self.discount {
            if *discount < BigDecimal::from(0) {
                return Err(DomainError::InvalidInput(
                    "discount cannot be negative".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ListResult {
    pub items: Vec<Order>,
    pub total: i64,
}

/// Row offset of a 1-based page. Pages past `i64` range are rejected.
pub fn page_offset(page: i64, limit: i64) -> Result<i64, DomainError> {
    page.max(1)
        .checked_sub(1)
        .and_then(|skipped| skipped.checked_mul(limit.max(0)))
        .ok_or_else(|| DomainError::InvalidInput(format!("page {} is out of range", page)))
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::domain::errors::RuleViolation;

    fn order(status: OrderStatus) -> Order {
        let now = Utc::now();
        Order {
            id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            delivery_address_id: Uuid::new_v4(),
            lines: vec![OrderLine {
                id: Uuid::new_v4(),
                product_id: Uuid::new_v4(),
                product_name: "X-Burguer".to_string(),
                quantity: 2,
                unit_price: BigDecimal::from_str("45.00").unwrap(),
                original_price: None,
                had_promotion: false,
                promotion_name: None,
                subtotal: BigDecimal::from_str("90.00").unwrap(),
                note: None,
            }],
            delivery_distance_km: 2.0,
            delivery_fee: BigDecimal::from_str("9.00").unwrap(),
            discount: None,
            total: BigDecimal::from_str("99.00").unwrap(),
            status,
            cancellation_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn item(quantity: i32) -> OrderItemRequest {
        OrderItemRequest {
            product_id: Uuid::new_v4(),
            quantity,
            note: None,
        }
    }

    #[test]
    fn items_subtotal_sums_lines() {
        assert_eq!(
            order(OrderStatus::Pendente).items_subtotal(),
            BigDecimal::from_str("90.00").unwrap()
        );
    }

    #[test]
    fn transition_updates_status_and_timestamp() {
        let mut o = order(OrderStatus::Pendente);
        let at = o.created_at + chrono::Duration::minutes(5);
        o.transition(OrderStatus::Confirmado, None, at).unwrap();
        assert_eq!(o.status, OrderStatus::Confirmado);
        assert_eq!(o.updated_at, at);
        assert!(o.cancellation_reason.is_none());
    }

    #[test]
    fn cancelling_without_reason_uses_default() {
        let mut o = order(OrderStatus::Preparando);
        o.transition(OrderStatus::Cancelado, None, Utc::now()).unwrap();
        assert_eq!(
            o.cancellation_reason.as_deref(),
            Some(DEFAULT_CANCELLATION_REASON)
        );
    }

    #[test]
    fn cancelling_delivered_order_leaves_it_unchanged() {
        let mut o = order(OrderStatus::Entregue);
        let before = o.clone();
        let err = o
            .transition(OrderStatus::Cancelado, Some("late".into()), Utc::now())
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::BusinessRule(RuleViolation::IllegalTransition { .. })
        ));
        assert_eq!(o, before);
    }

    #[test]
    fn validate_rejects_empty_items() {
        let request = PlaceOrder {
            address_id: Uuid::new_v4(),
            items: vec![],
            discount: None,
        };
        assert!(matches!(request.validate(), Err(DomainError::InvalidInput(_))));
    }

    #[test]
    fn validate_rejects_non_positive_quantity() {
        let request = PlaceOrder {
            address_id: Uuid::new_v4(),
            items: vec![item(1), item(0)],
            discount: None,
        };
        assert!(matches!(request.validate(), Err(DomainError::InvalidInput(_))));
    }

    #[test]
    fn validate_rejects_negative_discount() {
        let request = PlaceOrder {
            address_id: Uuid::new_v4(),
            items: vec![item(1)],
            discount: Some(BigDecimal::from(-1)),
        };
        assert!(matches!(request.validate(), Err(DomainError::InvalidInput(_))));
    }

    #[test]
    fn page_offset_skips_previous_pages() {
        assert_eq!(page_offset(1, 20).unwrap(), 0);
        assert_eq!(page_offset(3, 20).unwrap(), 40);
    }

    #[test]
    fn page_offset_rejects_overflowing_page() {
        assert!(matches!(
            page_offset(i64::MAX, 100),
            Err(DomainError::InvalidInput(_))
        ));
    }
}
