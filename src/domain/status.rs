//! Order lifecycle.
//!
//! ```text
//! PENDENTE ──► CONFIRMADO ──► PREPARANDO ──► DESPACHADO ──► ENTREGUE
//!     │             │              │              │
//!     └─────────────┴──────────────┴──────────────┴──► CANCELADO
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::{DomainError, RuleViolation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pendente,
    Confirmado,
    Preparando,
    Despachado,
    Entregue,
    Cancelado,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pendente,
        OrderStatus::Confirmado,
        OrderStatus::Preparando,
        OrderStatus::Despachado,
        OrderStatus::Entregue,
        OrderStatus::Cancelado,
    ];

    /// The transition table. Anything not listed here is illegal.
    pub fn allowed_targets(&self) -> &'static [OrderStatus] {
        use OrderStatus::*;
        match self {
            Pendente => &[Confirmado, Cancelado],
            Confirmado => &[Preparando, Cancelado],
            Preparando => &[Despachado, Cancelado],
            Despachado => &[Entregue, Cancelado],
            Entregue | Cancelado => &[],
        }
    }

    pub fn can_transition_to(&self, target: OrderStatus) -> bool {
        self.allowed_targets().contains(&target)
    }

    pub fn is_terminal(&self) -> bool {
        self.allowed_targets().is_empty()
    }

    /// Statuses from which a customer may still cancel on their own.
    pub fn is_customer_cancellable(&self) -> bool {
        matches!(self, OrderStatus::Pendente | OrderStatus::Confirmado)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pendente => "PENDENTE",
            OrderStatus::Confirmado => "CONFIRMADO",
            OrderStatus::Preparando => "PREPARANDO",
            OrderStatus::Despachado => "DESPACHADO",
            OrderStatus::Entregue => "ENTREGUE",
            OrderStatus::Cancelado => "CANCELADO",
        }
    }
}

pub fn can_transition(from: OrderStatus, to: OrderStatus) -> bool {
    from.can_transition_to(to)
}

/// Validates `from -> to` against the table.
pub fn check_transition(from: OrderStatus, to: OrderStatus) -> Result<(), DomainError> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(RuleViolation::IllegalTransition { from, to }.into())
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| DomainError::InvalidInput(format!("unknown order status '{}'", s)))
    }
}
