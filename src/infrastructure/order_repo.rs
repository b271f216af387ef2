use diesel::pg::PgConnection;
use diesel::prelude::*;
use serde_json::json;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::order::{page_offset, ListResult, Order};
use crate::domain::ports::OrderRepository;
use crate::schema::{order_lines, order_outbox, orders};

use super::models::{
    order_from_rows, NewOrderLineRow, NewOrderRow, NewOutboxEventRow, OrderLineRow, OrderRow,
};

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<diesel::result::Error> for DomainError {
    fn from(e: diesel::result::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

impl From<r2d2::Error> for DomainError {
    fn from(e: r2d2::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

// ── Outbox ────────────────────────────────────────────────────────────────────

pub const ORDER_PLACED: &str = "OrderPlaced";
pub const ORDER_STATUS_CHANGED: &str = "OrderStatusChanged";

fn append_outbox_event(
    conn: &mut PgConnection,
    order_id: Uuid,
    event_type: &str,
    payload: serde_json::Value,
) -> Result<(), DomainError> {
    diesel::insert_into(order_outbox::table)
        .values(&NewOutboxEventRow {
            id: Uuid::new_v4(),
            aggregate_type: "Order".to_string(),
            aggregate_id: order_id.to_string(),
            event_type: event_type.to_string(),
            payload,
        })
        .execute(conn)?;
    Ok(())
}

fn order_placed_payload(order: &Order) -> serde_json::Value {
    let lines: Vec<serde_json::Value> = order
        .lines
        .iter()
        .map(|l| {
            json!({
                "product_id": l.product_id,
                "product_name": l.product_name,
                "quantity": l.quantity,
                "unit_price": l.unit_price.to_string(),
                "had_promotion": l.had_promotion,
                "subtotal": l.subtotal.to_string()
            })
        })
        .collect();

    json!({
        "order_id": order.id,
        "customer_id": order.customer_id,
        "status": order.status,
        "items_subtotal": order.items_subtotal().to_string(),
        "delivery_fee": order.delivery_fee.to_string(),
        "discount": order.discount.as_ref().map(|d| d.to_string()),
        "total": order.total.to_string(),
        "lines": lines,
        "occurred_at": order.created_at
    })
}

// ── Repository ────────────────────────────────────────────────────────────────

pub struct DieselOrderRepository {
    pool: DbPool,
}

impl DieselOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn load_lines(
        conn: &mut PgConnection,
        order_id: Uuid,
    ) -> Result<Vec<OrderLineRow>, DomainError> {
        Ok(order_lines::table
            .filter(order_lines::order_id.eq(order_id))
            .select(OrderLineRow::as_select())
            .order(order_lines::position.asc())
            .load(conn)?)
    }

    fn with_lines(
        conn: &mut PgConnection,
        rows: Vec<OrderRow>,
    ) -> Result<Vec<Order>, DomainError> {
        let lines = OrderLineRow::belonging_to(&rows)
            .select(OrderLineRow::as_select())
            .order(order_lines::position.asc())
            .load(conn)?;

        lines
            .grouped_by(&rows)
            .into_iter()
            .zip(rows)
            .map(|(lines, row)| order_from_rows(row, lines))
            .collect()
    }
}

impl OrderRepository for DieselOrderRepository {
    fn save(&self, order: &Order) -> Result<Order, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            diesel::insert_into(orders::table)
                .values(&NewOrderRow::from_order(order))
                .execute(conn)?;

            let new_lines: Vec<NewOrderLineRow> = order
                .lines
                .iter()
                .enumerate()
                .map(|(position, line)| {
                    NewOrderLineRow::from_line(order.id, position as i32, line)
                })
                .collect();
            diesel::insert_into(order_lines::table)
                .values(&new_lines)
                .execute(conn)?;

            append_outbox_event(conn, order.id, ORDER_PLACED, order_placed_payload(order))?;

            Ok(order.clone())
        })
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, DomainError> {
        let mut conn = self.pool.get()?;

        let order = orders::table
            .filter(orders::id.eq(id))
            .select(OrderRow::as_select())
            .first(&mut conn)
            .optional()?;

        let Some(order) = order else {
            return Ok(None);
        };

        let lines = Self::load_lines(&mut conn, order.id)?;
        order_from_rows(order, lines).map(Some)
    }

    fn list(&self, page: i64, limit: i64) -> Result<ListResult, DomainError> {
        let mut conn = self.pool.get()?;

        let offset = page_offset(page, limit)?;
        conn.transaction::<_, DomainError, _>(|conn| {
            let total: i64 = orders::table.count().get_result(conn)?;

            let rows = orders::table
                .select(OrderRow::as_select())
                .order(orders::created_at.desc())
                .limit(limit)
                .offset(offset)
                .load(conn)?;

            Ok(ListResult {
                items: Self::with_lines(conn, rows)?,
                total,
            })
        })
    }

    fn list_for_customer(
        &self,
        customer_id: Uuid,
        page: i64,
        limit: i64,
    ) -> Result<ListResult, DomainError> {
        let mut conn = self.pool.get()?;

        let offset = page_offset(page, limit)?;
        conn.transaction::<_, DomainError, _>(|conn| {
            let total: i64 = orders::table
                .filter(orders::customer_id.eq(customer_id))
                .count()
                .get_result(conn)?;

            let rows = orders::table
                .filter(orders::customer_id.eq(customer_id))
                .select(OrderRow::as_select())
                .order(orders::created_at.desc())
                .limit(limit)
                .offset(offset)
                .load(conn)?;

            Ok(ListResult {
                items: Self::with_lines(conn, rows)?,
                total,
            })
        })
    }

    fn update_status<F>(&self, id: Uuid, change: F) -> Result<Order, DomainError>
    where
        F: FnOnce(&mut Order) -> Result<(), DomainError>,
    {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            // Row lock serializes concurrent transitions of the same order.
            let row = orders::table
                .filter(orders::id.eq(id))
                .select(OrderRow::as_select())
                .for_update()
                .first(conn)
                .optional()?
                .ok_or_else(|| DomainError::not_found("Order", id))?;

            let lines = Self::load_lines(conn, id)?;
            let mut order = order_from_rows(row, lines)?;
            let from = order.status;

            change(&mut order)?;

            diesel::update(orders::table.filter(orders::id.eq(id)))
                .set((
                    orders::status.eq(order.status.as_str()),
                    orders::cancellation_reason.eq(order.cancellation_reason.clone()),
                    orders::updated_at.eq(order.updated_at),
                ))
                .execute(conn)?;

            append_outbox_event(
                conn,
                id,
                ORDER_STATUS_CHANGED,
                json!({
                    "order_id": id,
                    "from": from,
                    "to": order.status,
                    "cancellation_reason": order.cancellation_reason,
                    "occurred_at": order.updated_at
                }),
            )?;

            Ok(order)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use bigdecimal::BigDecimal;
    use chrono::{Duration, Utc};
    use diesel::prelude::*;
    use uuid::Uuid;

    use super::{DieselOrderRepository, ORDER_PLACED, ORDER_STATUS_CHANGED};
    use crate::domain::errors::{DomainError, RuleViolation};
    use crate::domain::order::{Order, OrderLine};
    use crate::domain::ports::OrderRepository;
    use crate::domain::status::OrderStatus;
    use crate::infrastructure::models::OutboxEventRow;
    use crate::infrastructure::test_support::setup_db;
    use crate::schema::order_outbox;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).expect("valid decimal")
    }

    fn line(name: &str, price: &str, quantity: i32) -> OrderLine {
        OrderLine {
            id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            product_name: name.to_string(),
            quantity,
            unit_price: dec(price),
            original_price: None,
            had_promotion: false,
            promotion_name: None,
            subtotal: dec(price) * BigDecimal::from(quantity),
            note: None,
        }
    }

    fn make_order(customer_id: Uuid, age_minutes: i64) -> Order {
        // Postgres keeps microseconds; trim so round-trips compare equal.
        let now = Utc::now() - Duration::minutes(age_minutes);
        let now = chrono::DateTime::from_timestamp_micros(now.timestamp_micros())
            .expect("valid timestamp");
        let mut promoted = line("Pizza", "18.00", 1);
        promoted.original_price = Some(dec("25.00"));
        promoted.had_promotion = true;
        promoted.promotion_name = Some("Terça da pizza".to_string());
        promoted.note = Some("bem passada".to_string());

        Order {
            id: Uuid::new_v4(),
            customer_id,
            delivery_address_id: Uuid::new_v4(),
            lines: vec![line("X-Burguer", "45.00", 2), promoted],
            delivery_distance_km: 2.0,
            delivery_fee: dec("9.00"),
            discount: None,
            total: dec("117.00"),
            status: OrderStatus::Pendente,
            cancellation_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn outbox_events(pool: &crate::db::DbPool, order_id: Uuid) -> Vec<OutboxEventRow> {
        let mut conn = pool.get().expect("Failed to get connection");
        order_outbox::table
            .filter(order_outbox::aggregate_id.eq(order_id.to_string()))
            .select(OutboxEventRow::as_select())
            .order(order_outbox::created_at.asc())
            .load(&mut conn)
            .expect("query failed")
    }

    #[tokio::test]
    async fn save_and_find_by_id_roundtrip() {
        let (_container, pool) = setup_db().await;
        let repo = DieselOrderRepository::new(pool);
        let order = make_order(Uuid::new_v4(), 0);

        repo.save(&order).expect("save failed");

        let found = repo
            .find_by_id(order.id)
            .expect("find failed")
            .expect("order should exist");

        assert_eq!(found, order);
        assert_eq!(found.lines[0].product_name, "X-Burguer");
        assert_eq!(found.lines[1].promotion_name.as_deref(), Some("Terça da pizza"));
    }

    #[tokio::test]
    async fn save_writes_outbox_event_in_same_transaction() {
        let (_container, pool) = setup_db().await;
        let repo = DieselOrderRepository::new(pool.clone());
        let order = make_order(Uuid::new_v4(), 0);

        repo.save(&order).expect("save failed");

        let events = outbox_events(&pool, order.id);
        assert_eq!(events.len(), 1, "exactly one outbox event per new order");
        assert_eq!(events[0].aggregate_type, "Order");
        assert_eq!(events[0].event_type, ORDER_PLACED);
        assert_eq!(events[0].payload["status"], "PENDENTE");
        assert_eq!(events[0].payload["total"], "117.00");
    }

    #[tokio::test]
    async fn find_by_id_returns_none_for_unknown_id() {
        let (_container, pool) = setup_db().await;
        let repo = DieselOrderRepository::new(pool);

        let result = repo
            .find_by_id(Uuid::new_v4())
            .expect("find should not error");

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn save_is_all_or_nothing_when_a_line_is_rejected() {
        let (_container, pool) = setup_db().await;
        let repo = DieselOrderRepository::new(pool.clone());
        let mut order = make_order(Uuid::new_v4(), 0);
        order.lines[1].quantity = 0;

        let err = repo.save(&order).unwrap_err();

        assert!(matches!(err, DomainError::Internal(_)));
        assert!(repo.find_by_id(order.id).expect("find failed").is_none());
        assert!(outbox_events(&pool, order.id).is_empty());
    }

    #[tokio::test]
    async fn list_rejects_page_beyond_offset_range() {
        let (_container, pool) = setup_db().await;
        let repo = DieselOrderRepository::new(pool);

        let err = repo.list(i64::MAX, 100).unwrap_err();

        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn update_status_persists_and_emits_event() {
        let (_container, pool) = setup_db().await;
        let repo = DieselOrderRepository::new(pool.clone());
        let order = make_order(Uuid::new_v4(), 0);
        repo.save(&order).expect("save failed");

        let at = order.created_at + Duration::minutes(3);
        let updated = repo
            .update_status(order.id, |o| o.transition(OrderStatus::Confirmado, None, at))
            .expect("update failed");

        assert_eq!(updated.status, OrderStatus::Confirmado);
        let stored = repo.find_by_id(order.id).unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Confirmado);
        assert_eq!(stored.updated_at, at);

        let events = outbox_events(&pool, order.id);
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].event_type, ORDER_STATUS_CHANGED);
        assert_eq!(events[1].payload["from"], "PENDENTE");
        assert_eq!(events[1].payload["to"], "CONFIRMADO");
    }

    #[tokio::test]
    async fn failed_change_writes_nothing() {
        let (_container, pool) = setup_db().await;
        let repo = DieselOrderRepository::new(pool.clone());
        let order = make_order(Uuid::new_v4(), 0);
        repo.save(&order).expect("save failed");

        let err = repo
            .update_status(order.id, |o| {
                o.transition(OrderStatus::Entregue, None, Utc::now())
            })
            .unwrap_err();

        assert!(matches!(
            err,
            DomainError::BusinessRule(RuleViolation::IllegalTransition { .. })
        ));
        let stored = repo.find_by_id(order.id).unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Pendente);
        assert_eq!(outbox_events(&pool, order.id).len(), 1);
    }

    #[tokio::test]
    async fn update_status_of_unknown_order_is_not_found() {
        let (_container, pool) = setup_db().await;
        let repo = DieselOrderRepository::new(pool);

        let err = repo
            .update_status(Uuid::new_v4(), |_| Ok(()))
            .unwrap_err();

        assert!(matches!(err, DomainError::NotFound { entity: "Order", .. }));
    }

    #[tokio::test]
    async fn list_paginates_newest_first() {
        let (_container, pool) = setup_db().await;
        let repo = DieselOrderRepository::new(pool);
        let customer_id = Uuid::new_v4();

        let mut ids = Vec::new();
        for age in (0..5).rev() {
            let order = make_order(customer_id, age);
            ids.push(order.id);
            repo.save(&order).expect("save failed");
        }

        let page1 = repo.list(1, 3).expect("list page 1 failed");
        assert_eq!(page1.total, 5);
        assert_eq!(page1.items.len(), 3);
        assert_eq!(page1.items[0].id, ids[4]);
        assert_eq!(page1.items[0].lines.len(), 2);

        let page2 = repo.list(2, 3).expect("list page 2 failed");
        assert_eq!(page2.total, 5);
        assert_eq!(page2.items.len(), 2);
    }

    #[tokio::test]
    async fn list_for_customer_filters_by_owner() {
        let (_container, pool) = setup_db().await;
        let repo = DieselOrderRepository::new(pool);
        let customer_id = Uuid::new_v4();

        repo.save(&make_order(customer_id, 1)).expect("save failed");
        repo.save(&make_order(Uuid::new_v4(), 0)).expect("save failed");

        let mine = repo
            .list_for_customer(customer_id, 1, 20)
            .expect("list failed");
        assert_eq!(mine.total, 1);
        assert_eq!(mine.items[0].customer_id, customer_id);
    }
}
