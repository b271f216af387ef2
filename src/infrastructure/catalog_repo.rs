use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::catalog::{Address, Product};
use crate::domain::errors::DomainError;
use crate::domain::ports::{AddressStore, ProductCatalog};
use crate::schema::{addresses, products};

use super::models::{product_from_rows, AddressRow, ProductRow, PromotionRow};

pub struct DieselAddressStore {
    pool: DbPool,
}

impl DieselAddressStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl AddressStore for DieselAddressStore {
    fn find_by_id(&self, id: Uuid) -> Result<Option<Address>, DomainError> {
        let mut conn = self.pool.get()?;

        let row = addresses::table
            .filter(addresses::id.eq(id))
            .select(AddressRow::as_select())
            .first(&mut conn)
            .optional()?;

        Ok(row.map(Address::from))
    }
}

pub struct DieselProductCatalog {
    pool: DbPool,
}

impl DieselProductCatalog {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl ProductCatalog for DieselProductCatalog {
    /// Loads the product with all of its promotions; filtering by date
    /// happens at pricing time.
    fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, DomainError> {
        let mut conn = self.pool.get()?;

        let row = products::table
            .filter(products::id.eq(id))
            .select(ProductRow::as_select())
            .first(&mut conn)
            .optional()?;

        let Some(row) = row else {
            return Ok(None);
        };

        let promotions = PromotionRow::belonging_to(&row)
            .select(PromotionRow::as_select())
            .load(&mut conn)?;

        product_from_rows(row, promotions).map(Some)
    }
}
