use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use super::catalog::{Address, Product};
use super::errors::DomainError;
use super::order::{ListResult, Order};

pub trait OrderRepository: Send + Sync + 'static {
    /// Stores the order and all of its lines atomically.
    fn save(&self, order: &Order) -> Result<Order, DomainError>;
    fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, DomainError>;
    fn list(&self, page: i64, limit: i64) -> Result<ListResult, DomainError>;
    fn list_for_customer(
        &self,
        customer_id: Uuid,
        page: i64,
        limit: i64,
    ) -> Result<ListResult, DomainError>;
    /// Applies `change` to the current order under a per-order lock and
    /// persists the result. Nothing is written if `change` fails.
    fn update_status<F>(&self, id: Uuid, change: F) -> Result<Order, DomainError>
    where
        F: FnOnce(&mut Order) -> Result<(), DomainError>;
}

pub trait AddressStore: Send + Sync + 'static {
    fn find_by_id(&self, id: Uuid) -> Result<Option<Address>, DomainError>;
}

pub trait ProductCatalog: Send + Sync + 'static {
    fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, DomainError>;
}

/// Identity of the principal acting on the current request.
pub trait CustomerContext {
    fn current(&self) -> Result<Uuid, DomainError>;
}

pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
