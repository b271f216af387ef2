//! In-memory adapters for tests and local experiments.
//!
//! Every adapter is a cheap `Clone` over shared state, so a test can keep a
//! handle and inspect what the service wrote.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::catalog::{Address, Product};
use crate::domain::errors::DomainError;
use crate::domain::order::{page_offset, ListResult, Order};
use crate::domain::ports::{AddressStore, Clock, OrderRepository, ProductCatalog};

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, DomainError> {
    mutex
        .lock()
        .map_err(|e| DomainError::Internal(format!("poisoned lock: {}", e)))
}

#[derive(Clone, Default)]
pub struct InMemoryOrderRepository {
    orders: Arc<Mutex<HashMap<Uuid, Order>>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.orders.lock().map(|o| o.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn page(
        &self,
        page: i64,
        limit: i64,
        keep: impl Fn(&Order) -> bool,
    ) -> Result<ListResult, DomainError> {
        let offset = page_offset(page, limit)?;
        let orders = lock(&self.orders)?;
        let mut matching: Vec<&Order> = orders.values().filter(|&o| keep(o)).collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(ListResult {
            total: matching.len() as i64,
            items: matching
                .into_iter()
                .skip(usize::try_from(offset).unwrap_or(usize::MAX))
                .take(limit.max(0) as usize)
                .cloned()
                .collect(),
        })
    }
}

impl OrderRepository for InMemoryOrderRepository {
    fn save(&self, order: &Order) -> Result<Order, DomainError> {
        lock(&self.orders)?.insert(order.id, order.clone());
        Ok(order.clone())
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, DomainError> {
        Ok(lock(&self.orders)?.get(&id).cloned())
    }

    fn list(&self, page: i64, limit: i64) -> Result<ListResult, DomainError> {
        self.page(page, limit, |_| true)
    }

    fn list_for_customer(
        &self,
        customer_id: Uuid,
        page: i64,
        limit: i64,
    ) -> Result<ListResult, DomainError> {
        self.page(page, limit, |o| o.customer_id == customer_id)
    }

    fn update_status<F>(&self, id: Uuid, change: F) -> Result<Order, DomainError>
    where
        F: FnOnce(&mut Order) -> Result<(), DomainError>,
    {
        let mut orders = lock(&self.orders)?;
        let stored = orders
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("Order", id))?;

        // Work on a copy so a failed change leaves the stored order intact.
        let mut updated = stored.clone();
        change(&mut updated)?;
        *stored = updated.clone();
        Ok(updated)
    }
}

#[derive(Clone, Default)]
pub struct InMemoryAddressStore {
    addresses: Arc<Mutex<HashMap<Uuid, Address>>>,
}

impl InMemoryAddressStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, address: Address) {
        if let Ok(mut addresses) = self.addresses.lock() {
            addresses.insert(address.id, address);
        }
    }
}

impl AddressStore for InMemoryAddressStore {
    fn find_by_id(&self, id: Uuid) -> Result<Option<Address>, DomainError> {
        Ok(lock(&self.addresses)?.get(&id).cloned())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryProductCatalog {
    products: Arc<Mutex<HashMap<Uuid, Product>>>,
    lookups: Arc<Mutex<usize>>,
}

impl InMemoryProductCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, product: Product) {
        if let Ok(mut products) = self.products.lock() {
            products.insert(product.id, product);
        }
    }

    /// Number of `find_by_id` calls served so far.
    pub fn lookups(&self) -> usize {
        self.lookups.lock().map(|n| *n).unwrap_or_default()
    }
}

impl ProductCatalog for InMemoryProductCatalog {
    fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, DomainError> {
        *lock(&self.lookups)? += 1;
        Ok(lock(&self.products)?.get(&id).cloned())
    }
}

/// Clock pinned to a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
