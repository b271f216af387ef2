pub mod orders;

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        orders::place_order,
        orders::get_order,
        orders::list_orders,
        orders::list_my_orders,
        orders::transition_order,
        orders::cancel_order,
    ),
    components(schemas(
        orders::PlaceOrderRequest,
        orders::PlaceOrderItemRequest,
        orders::TransitionOrderRequest,
        orders::CancelOrderRequest,
        orders::OrderResponse,
        orders::OrderLineResponse,
        orders::PartnerRedirectResponse,
        orders::ListOrdersResponse,
    )),
    tags((name = "orders", description = "Order placement and lifecycle"))
)]
pub struct ApiDoc;
