//! Cart, courier rate, pricing and checkout services.

pub mod cart_aggregator;
pub mod cart_service;
pub mod checkout_service;
pub mod courier_service;
pub mod pricing_service;

pub use cart_aggregator::{
    estimated_total, group_by_merchant, select_courier, total_courier_cost, MerchantGroup,
};
pub use cart_service::CartService;
pub use checkout_service::CheckoutService;
pub use courier_service::{choose_quote, CourierRateService};
pub use pricing_service::PriceChecker;
