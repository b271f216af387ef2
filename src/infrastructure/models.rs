use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::catalog::{Address, Product, Promotion, PromotionKind};
use crate::domain::errors::DomainError;
use crate::domain::order::{Order, OrderLine};
use crate::domain::status::OrderStatus;
use crate::schema::{addresses, order_lines, order_outbox, orders, products, promotions};

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderRow {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub delivery_address_id: Uuid,
    pub delivery_distance_km: f64,
    pub delivery_fee: BigDecimal,
    pub discount: Option<BigDecimal>,
    pub total: BigDecimal,
    pub status: String,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = orders)]
pub struct NewOrderRow {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub delivery_address_id: Uuid,
    pub delivery_distance_km: f64,
    pub delivery_fee: BigDecimal,
    pub discount: Option<BigDecimal>,
    pub total: BigDecimal,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = order_lines)]
#[diesel(belongs_to(OrderRow, foreign_key = order_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderLineRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub position: i32,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub original_price: Option<BigDecimal>,
    pub had_promotion: bool,
    pub promotion_name: Option<String>,
    pub subtotal: BigDecimal,
    pub note: Option<String>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_lines)]
pub struct NewOrderLineRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub position: i32,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub original_price: Option<BigDecimal>,
    pub had_promotion: bool,
    pub promotion_name: Option<String>,
    pub subtotal: BigDecimal,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = order_outbox)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OutboxEventRow {
    pub id: Uuid,
    pub aggregate_type: String,
    pub aggregate_id: String,
    pub event_type: String,
    pub payload: Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_outbox)]
pub struct NewOutboxEventRow {
    pub id: Uuid,
    pub aggregate_type: String,
    pub aggregate_id: String,
    pub event_type: String,
    pub payload: Value,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = addresses)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AddressRow {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    pub is_active: bool,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductRow {
    pub id: Uuid,
    pub name: String,
    pub base_price: BigDecimal,
    pub is_paused: bool,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = promotions)]
#[diesel(belongs_to(ProductRow, foreign_key = product_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PromotionRow {
    pub id: Uuid,
    pub product_id: Uuid,
    pub name: String,
    pub kind: String,
    pub value: BigDecimal,
    pub is_active: bool,
    pub starts_on: NaiveDate,
    pub ends_on: NaiveDate,
}

// ── Row <-> domain mapping ────────────────────────────────────────────────────

pub const PERCENTAGE: &str = "PERCENTAGE";
pub const FIXED_AMOUNT: &str = "FIXED_AMOUNT";

impl NewOrderRow {
    pub fn from_order(order: &Order) -> Self {
        Self {
            id: order.id,
            customer_id: order.customer_id,
            delivery_address_id: order.delivery_address_id,
            delivery_distance_km: order.delivery_distance_km,
            delivery_fee: order.delivery_fee.clone(),
            discount: order.discount.clone(),
            total: order.total.clone(),
            status: order.status.as_str().to_string(),
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

impl NewOrderLineRow {
    pub fn from_line(order_id: Uuid, position: i32, line: &OrderLine) -> Self {
        Self {
            id: line.id,
            order_id,
            position,
            product_id: line.product_id,
            product_name: line.product_name.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price.clone(),
            original_price: line.original_price.clone(),
            had_promotion: line.had_promotion,
            promotion_name: line.promotion_name.clone(),
            subtotal: line.subtotal.clone(),
            note: line.note.clone(),
        }
    }
}

impl From<OrderLineRow> for OrderLine {
    fn from(row: OrderLineRow) -> Self {
        Self {
            id: row.id,
            product_id: row.product_id,
            product_name: row.product_name,
            quantity: row.quantity,
            unit_price: row.unit_price,
            original_price: row.original_price,
            had_promotion: row.had_promotion,
            promotion_name: row.promotion_name,
            subtotal: row.subtotal,
            note: row.note,
        }
    }
}

/// Rebuilds the aggregate. `lines` must already be sorted by position.
pub fn order_from_rows(row: OrderRow, lines: Vec<OrderLineRow>) -> Result<Order, DomainError> {
    let status: OrderStatus = row.status.parse().map_err(|_| {
        DomainError::Internal(format!("order {} has unknown status '{}'", row.id, row.status))
    })?;

    Ok(Order {
        id: row.id,
        customer_id: row.customer_id,
        delivery_address_id: row.delivery_address_id,
        lines: lines.into_iter().map(OrderLine::from).collect(),
        delivery_distance_km: row.delivery_distance_km,
        delivery_fee: row.delivery_fee,
        discount: row.discount,
        total: row.total,
        status,
        cancellation_reason: row.cancellation_reason,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

impl From<AddressRow> for Address {
    fn from(row: AddressRow) -> Self {
        Self {
            id: row.id,
            owner_id: row.customer_id,
            latitude: row.latitude,
            longitude: row.longitude,
            is_active: row.is_active,
        }
    }
}

impl TryFrom<PromotionRow> for Promotion {
    type Error = DomainError;

    fn try_from(row: PromotionRow) -> Result<Self, Self::Error> {
        let kind = match row.kind.as_str() {
            PERCENTAGE => PromotionKind::Percentage(row.value),
            FIXED_AMOUNT => PromotionKind::FixedAmount(row.value),
            other => {
                return Err(DomainError::Internal(format!(
                    "promotion {} has unknown kind '{}'",
                    row.id, other
                )))
            }
        };
        Ok(Self {
            id: row.id,
            name: row.name,
            kind,
            is_active: row.is_active,
            starts_on: row.starts_on,
            ends_on: row.ends_on,
        })
    }
}

pub fn product_from_rows(
    row: ProductRow,
    promotions: Vec<PromotionRow>,
) -> Result<Product, DomainError> {
    Ok(Product {
        id: row.id,
        name: row.name,
        base_price: row.base_price,
        is_paused: row.is_paused,
        promotions: promotions
            .into_iter()
            .map(Promotion::try_from)
            .collect::<Result<_, _>>()?,
    })
}
