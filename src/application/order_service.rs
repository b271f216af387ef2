use uuid::Uuid;

use crate::config::DeliveryConfig;
use crate::domain::catalog::Address;
use crate::domain::errors::{DomainError, RuleViolation};
use crate::domain::order::{
    ListResult, Order, OrderItemRequest, OrderLine, OrderResult, PartnerRedirect, PlaceOrder,
};
use crate::domain::ports::{AddressStore, Clock, OrderRepository, ProductCatalog, SystemClock};
use crate::domain::pricing;
use crate::domain::status::OrderStatus;

pub const CUSTOMER_CANCELLATION_REASON: &str = "Cancelado pelo cliente";
pub const STAFF_CANCELLATION_REASON: &str = "Cancelado pelo estabelecimento";

pub struct OrderService<R, A, P, C = SystemClock> {
    orders: R,
    addresses: A,
    products: P,
    clock: C,
    config: DeliveryConfig,
}

impl<R, A, P, C> OrderService<R, A, P, C>
where
    R: OrderRepository,
    A: AddressStore,
    P: ProductCatalog,
    C: Clock,
{
    pub fn new(orders: R, addresses: A, products: P, clock: C, config: DeliveryConfig) -> Self {
        Self {
            orders,
            addresses,
            products,
            clock,
            config,
        }
    }

    /// Validates and prices a request, then stores it as a PENDENTE order.
    ///
    /// Addresses outside the delivery radius short-circuit into a partner
    /// redirect before any product is looked up, and nothing is stored.
    pub fn place_order(
        &self,
        customer_id: Uuid,
        request: PlaceOrder,
    ) -> Result<OrderResult, DomainError> {
        request.validate()?;
        let discount = request.discount.as_ref().map(pricing::round_money);

        let address = self.deliverable_address(customer_id, request.address_id)?;
        let distance_km = self.config.store_location.distance_to(&address.coordinates());
        if !self.config.radius.is_deliverable(distance_km) {
            log::info!(
                "Address {} is {:.2} km away, redirecting customer {} to partners",
                address.id,
                distance_km,
                customer_id
            );
            return Ok(OrderResult::RedirectToPartners(PartnerRedirect {
                distance_km,
                partner_links: self.config.partner_links.clone(),
            }));
        }

        let lines = request
            .items
            .iter()
            .map(|item| self.price_line(item))
            .collect::<Result<Vec<_>, _>>()?;

        let delivery_fee = pricing::delivery_fee(distance_km, &self.config.tariff);
        let gross = pricing::order_total(lines.iter().map(|l| &l.subtotal), &delivery_fee, None);
        if let Some(discount) = &discount {
            if *discount > gross {
                return Err(RuleViolation::DiscountExceedsTotal {
                    discount: discount.to_string(),
                    total: gross.to_string(),
                }
                .into());
            }
        }
        let total = pricing::order_total(
            lines.iter().map(|l| &l.subtotal),
            &delivery_fee,
            discount.as_ref(),
        );

        let now = self.clock.now();
        let order = self.orders.save(&Order {
            id: Uuid::new_v4(),
            customer_id,
            delivery_address_id: address.id,
            lines,
            delivery_distance_km: distance_km,
            delivery_fee,
            discount,
            total,
            status: OrderStatus::Pendente,
            cancellation_reason: None,
            created_at: now,
            updated_at: now,
        })?;

        log::info!(
            "Placed order {} for customer {} ({} lines, total {})",
            order.id,
            customer_id,
            order.lines.len(),
            order.total
        );
        Ok(OrderResult::Placed(order))
    }

    fn deliverable_address(
        &self,
        customer_id: Uuid,
        address_id: Uuid,
    ) -> Result<Address, DomainError> {
        let address = self
            .addresses
            .find_by_id(address_id)?
            .ok_or_else(|| DomainError::not_found("Address", address_id))?;

        if address.owner_id != customer_id {
            log::warn!(
                "Customer {} tried to order to address {} owned by someone else",
                customer_id,
                address_id
            );
            return Err(RuleViolation::AddressNotOwned {
                address_id,
                customer_id,
            }
            .into());
        }
        if !address.is_active {
            return Err(RuleViolation::AddressInactive(address_id).into());
        }
        Ok(address)
    }

    fn price_line(&self, item: &OrderItemRequest) -> Result<OrderLine, DomainError> {
        let product = self
            .products
            .find_by_id(item.product_id)?
            .ok_or_else(|| DomainError::not_found("Product", item.product_id))?;
        if product.is_paused {
            return Err(RuleViolation::ProductUnavailable(product.id).into());
        }

        let price =
            pricing::effective_price(&product.base_price, &product.promotions, self.clock.today());
        let subtotal = pricing::line_subtotal(&price.unit_price, item.quantity);
        let (original_price, promotion_name) = match price.promotion {
            Some(applied) => (Some(applied.original_price), Some(applied.name)),
            None => (None, None),
        };

        Ok(OrderLine {
            id: Uuid::new_v4(),
            product_id: product.id,
            product_name: product.name,
            quantity: item.quantity,
            unit_price: price.unit_price,
            had_promotion: original_price.is_some(),
            original_price,
            promotion_name,
            subtotal,
            note: item.note.clone(),
        })
    }

    /// Staff-side transition: any edge of the status table is allowed.
    pub fn transition_order(
        &self,
        order_id: Uuid,
        target: OrderStatus,
        reason: Option<String>,
    ) -> Result<Order, DomainError> {
        let at = self.clock.now();
        let reason = reason.or_else(|| {
            (target == OrderStatus::Cancelado).then(|| STAFF_CANCELLATION_REASON.to_string())
        });

        let mut from = None;
        let order = self
            .orders
            .update_status(order_id, |order| {
                from = Some(order.status);
                order.transition(target, reason, at)
            })
            .inspect_err(|e| log::warn!("Order {} not moved to {}: {}", order_id, target, e))?;

        if let Some(from) = from {
            log::info!("Order {} moved from {} to {}", order_id, from, target);
        }
        Ok(order)
    }

    /// Customer-side cancellation, limited to the customer's own orders
    /// while they are still PENDENTE or CONFIRMADO.
    pub fn cancel_order(
        &self,
        customer_id: Uuid,
        order_id: Uuid,
        reason: Option<String>,
    ) -> Result<Order, DomainError> {
        let at = self.clock.now();
        let reason = reason.unwrap_or_else(|| CUSTOMER_CANCELLATION_REASON.to_string());

        let order = self
            .orders
            .update_status(order_id, |order| {
                if order.customer_id != customer_id {
                    return Err(DomainError::not_found("Order", order_id));
                }
                if !order.status.is_customer_cancellable() {
                    return Err(RuleViolation::CustomerCancellationNotAllowed(order.status).into());
                }
                order.transition(OrderStatus::Cancelado, Some(reason), at)
            })
            .inspect_err(|e| {
                log::warn!(
                    "Customer {} could not cancel order {}: {}",
                    customer_id,
                    order_id,
                    e
                )
            })?;

        log::info!("Order {} cancelled by customer {}", order_id, customer_id);
        Ok(order)
    }

    pub fn get_order(&self, id: Uuid) -> Result<Option<Order>, DomainError> {
        self.orders.find_by_id(id)
    }

    pub fn list_orders(&self, page: i64, limit: i64) -> Result<ListResult, DomainError> {
        self.orders.list(page, limit)
    }

    pub fn list_customer_orders(
        &self,
        customer_id: Uuid,
        page: i64,
        limit: i64,
    ) -> Result<ListResult, DomainError> {
        self.orders.list_for_customer(customer_id, page, limit)
    }
}
