use std::collections::BTreeMap;
use std::future::{ready, Ready};
use std::str::FromStr;

use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest, HttpResponse};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::order_service::OrderService;
use crate::domain::errors::DomainError;
use crate::domain::order::{ListResult, Order, OrderItemRequest, OrderResult, PlaceOrder};
use crate::domain::ports::{CustomerContext, SystemClock};
use crate::domain::status::OrderStatus;
use crate::errors::AppError;
use crate::infrastructure::catalog_repo::{DieselAddressStore, DieselProductCatalog};
use crate::infrastructure::order_repo::DieselOrderRepository;

pub type AppOrderService =
    OrderService<DieselOrderRepository, DieselAddressStore, DieselProductCatalog, SystemClock>;

pub const CUSTOMER_HEADER: &str = "X-Customer-Id";

// ── Acting customer ──────────────────────────────────────────────────────────

/// Customer identity carried by the request. Authentication happens upstream;
/// this only reads the header the gateway sets.
pub struct RequestCustomer(Option<String>);

impl CustomerContext for RequestCustomer {
    fn current(&self) -> Result<Uuid, DomainError> {
        let raw = self.0.as_deref().ok_or_else(|| {
            DomainError::InvalidInput(format!("missing {} header", CUSTOMER_HEADER))
        })?;
        Uuid::parse_str(raw).map_err(|_| {
            DomainError::InvalidInput(format!("{} header is not a valid id", CUSTOMER_HEADER))
        })
    }
}

impl FromRequest for RequestCustomer {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let value = req
            .headers()
            .get(CUSTOMER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        ready(Ok(RequestCustomer(value)))
    }
}

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct PlaceOrderItemRequest {
    pub product_id: Uuid,
    pub quantity: i32,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PlaceOrderRequest {
    pub address_id: Uuid,
    pub items: Vec<PlaceOrderItemRequest>,
    /// Decimal amount as a string to avoid floating-point issues, e.g. "10.00"
    pub discount: Option<String>,
}

impl PlaceOrderRequest {
    fn into_domain(self) -> Result<PlaceOrder, DomainError> {
        let discount = self
            .discount
            .map(|raw| {
                BigDecimal::from_str(&raw).map_err(|e| {
                    DomainError::InvalidInput(format!("invalid discount '{}': {}", raw, e))
                })
            })
            .transpose()?;

        Ok(PlaceOrder {
            address_id: self.address_id,
            items: self
                .items
                .into_iter()
                .map(|i| OrderItemRequest {
                    product_id: i.product_id,
                    quantity: i.quantity,
                    note: i.note,
                })
                .collect(),
            discount,
        })
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TransitionOrderRequest {
    #[schema(value_type = String, example = "CONFIRMADO")]
    pub status: OrderStatus,
    pub reason: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CancelOrderRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderLineResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: String,
    pub original_price: Option<String>,
    pub had_promotion: bool,
    pub promotion_name: Option<String>,
    pub subtotal: String,
    pub note: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub delivery_address_id: Uuid,
    #[schema(value_type = String, example = "PENDENTE")]
    pub status: OrderStatus,
    pub lines: Vec<OrderLineResponse>,
    pub delivery_distance_km: f64,
    pub delivery_fee: String,
    pub discount: Option<String>,
    pub total: String,
    pub cancellation_reason: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            customer_id: order.customer_id,
            delivery_address_id: order.delivery_address_id,
            status: order.status,
            lines: order
                .lines
                .into_iter()
                .map(|l| OrderLineResponse {
                    id: l.id,
                    product_id: l.product_id,
                    product_name: l.product_name,
                    quantity: l.quantity,
                    unit_price: l.unit_price.to_string(),
                    original_price: l.original_price.map(|p| p.to_string()),
                    had_promotion: l.had_promotion,
                    promotion_name: l.promotion_name,
                    subtotal: l.subtotal.to_string(),
                    note: l.note,
                })
                .collect(),
            delivery_distance_km: order.delivery_distance_km,
            delivery_fee: order.delivery_fee.to_string(),
            discount: order.discount.map(|d| d.to_string()),
            total: order.total.to_string(),
            cancellation_reason: order.cancellation_reason,
            created_at: order.created_at.to_rfc3339(),
            updated_at: order.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PartnerRedirectResponse {
    /// Always `true`; lets clients tell this apart from an order.
    pub redirect_to_partners: bool,
    pub distance_km: f64,
    pub partner_links: BTreeMap<String, String>,
}

// ── Pagination ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListOrdersParams {
    /// Page number (1-based). Defaults to 1.
    #[serde(default = "default_page")]
    pub page: i64,
    /// Number of items per page. Defaults to 20, maximum 100.
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    20
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListOrdersResponse {
    pub items: Vec<OrderResponse>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

impl ListOrdersResponse {
    fn new(result: ListResult, page: i64, limit: i64) -> Self {
        Self {
            items: result.items.into_iter().map(OrderResponse::from).collect(),
            total: result.total,
            page,
            limit,
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /orders
///
/// Places an order for the acting customer. Returns 201 with the order, or
/// 200 with partner links when the address is outside the delivery radius.
#[utoipa::path(
    post,
    path = "/orders",
    request_body = PlaceOrderRequest,
    params(
        ("X-Customer-Id" = Uuid, Header, description = "Acting customer"),
    ),
    responses(
        (status = 201, description = "Order placed", body = OrderResponse),
        (status = 200, description = "Address out of range, use a partner", body = PartnerRedirectResponse),
        (status = 400, description = "Malformed request"),
        (status = 404, description = "Address or product not found"),
        (status = 422, description = "Business rule violated"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn place_order(
    service: web::Data<AppOrderService>,
    customer: RequestCustomer,
    body: web::Json<PlaceOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let customer_id = customer.current()?;
    let request = body.into_inner().into_domain()?;

    let result =
        web::block(move || service.place_order(customer_id, request)).await??;

    Ok(match result {
        OrderResult::Placed(order) => HttpResponse::Created().json(OrderResponse::from(order)),
        OrderResult::RedirectToPartners(redirect) => {
            HttpResponse::Ok().json(PartnerRedirectResponse {
                redirect_to_partners: true,
                distance_km: redirect.distance_km,
                partner_links: redirect.partner_links,
            })
        }
    })
}

/// GET /orders/{id}
#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    service: web::Data<AppOrderService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();

    let order = web::block(move || service.get_order(order_id))
        .await??
        .ok_or_else(|| DomainError::not_found("Order", order_id))?;

    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

/// GET /orders
///
/// Paginated list of all orders, newest first.
#[utoipa::path(
    get,
    path = "/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number (1-based, default 1)"),
        ("limit" = Option<i64>, Query, description = "Items per page (default 20, max 100)"),
    ),
    responses(
        (status = 200, description = "Paginated list of orders", body = ListOrdersResponse),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn list_orders(
    service: web::Data<AppOrderService>,
    query: web::Query<ListOrdersParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();
    let page = params.page.max(1);
    let limit = params.limit.clamp(1, 100);

    let result = web::block(move || service.list_orders(page, limit)).await??;

    Ok(HttpResponse::Ok().json(ListOrdersResponse::new(result, page, limit)))
}

/// GET /orders/mine
///
/// The acting customer's own orders, newest first.
#[utoipa::path(
    get,
    path = "/orders/mine",
    params(
        ("X-Customer-Id" = Uuid, Header, description = "Acting customer"),
        ("page" = Option<i64>, Query, description = "Page number (1-based, default 1)"),
        ("limit" = Option<i64>, Query, description = "Items per page (default 20, max 100)"),
    ),
    responses(
        (status = 200, description = "Paginated list of the customer's orders", body = ListOrdersResponse),
        (status = 400, description = "Missing customer header"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn list_my_orders(
    service: web::Data<AppOrderService>,
    customer: RequestCustomer,
    query: web::Query<ListOrdersParams>,
) -> Result<HttpResponse, AppError> {
    let customer_id = customer.current()?;
    let params = query.into_inner();
    let page = params.page.max(1);
    let limit = params.limit.clamp(1, 100);

    let result =
        web::block(move || service.list_customer_orders(customer_id, page, limit)).await??;

    Ok(HttpResponse::Ok().json(ListOrdersResponse::new(result, page, limit)))
}

/// POST /orders/{id}/status
///
/// Staff-side status change along the order lifecycle.
#[utoipa::path(
    post,
    path = "/orders/{id}/status",
    request_body = TransitionOrderRequest,
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    responses(
        (status = 200, description = "Order moved", body = OrderResponse),
        (status = 404, description = "Order not found"),
        (status = 422, description = "Transition not allowed"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn transition_order(
    service: web::Data<AppOrderService>,
    path: web::Path<Uuid>,
    body: web::Json<TransitionOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let TransitionOrderRequest { status, reason } = body.into_inner();

    let order =
        web::block(move || service.transition_order(order_id, status, reason)).await??;

    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

/// POST /orders/{id}/cancel
///
/// Customer-side cancellation of one of their own orders.
#[utoipa::path(
    post,
    path = "/orders/{id}/cancel",
    request_body = CancelOrderRequest,
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
        ("X-Customer-Id" = Uuid, Header, description = "Acting customer"),
    ),
    responses(
        (status = 200, description = "Order cancelled", body = OrderResponse),
        (status = 404, description = "Order not found"),
        (status = 422, description = "Order can no longer be cancelled by the customer"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn cancel_order(
    service: web::Data<AppOrderService>,
    customer: RequestCustomer,
    path: web::Path<Uuid>,
    body: Option<web::Json<CancelOrderRequest>>,
) -> Result<HttpResponse, AppError> {
    let customer_id = customer.current()?;
    let order_id = path.into_inner();
    let reason = body.map(|b| b.into_inner()).unwrap_or_default().reason;

    let order =
        web::block(move || service.cancel_order(customer_id, order_id, reason)).await??;

    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}
