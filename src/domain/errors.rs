use thiserror::Error;
use uuid::Uuid;

use super::status::OrderStatus;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },
    #[error("Business rule violated: {0}")]
    BusinessRule(#[from] RuleViolation),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        DomainError::NotFound { entity, id }
    }
}

/// Business rules an otherwise well-formed request can break.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuleViolation {
    #[error("address {address_id} does not belong to customer {customer_id}")]
    AddressNotOwned { address_id: Uuid, customer_id: Uuid },
    #[error("address {0} is inactive")]
    AddressInactive(Uuid),
    #[error("product {0} is unavailable")]
    ProductUnavailable(Uuid),
    #[error("cannot move order from {from} to {to}")]
    IllegalTransition { from: OrderStatus, to: OrderStatus },
    #[error("customers can only cancel orders that are PENDENTE or CONFIRMADO (current: {0})")]
    CustomerCancellationNotAllowed(OrderStatus),
    #[error("discount {discount} exceeds order total {total}")]
    DiscountExceedsTotal { discount: String, total: String },
}
