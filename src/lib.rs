//! Storefront client library
//!
//! Talks to the marketplace backend on behalf of a shopper: fetches and edits
//! the cart, groups it per merchant, quotes courier costs, asks the backend
//! to price a checkout and places the order. Session tokens are refreshed transparently.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod client;
pub mod config;
pub mod errors;
pub mod models;
pub mod services;
pub mod state;

use std::sync::Arc;
use validator::Validate;

use crate::auth::TokenStore;
use crate::client::TokenizedClient;
use crate::config::ClientConfig;
use crate::errors::ClientError;
use crate::services::commerce::{CartService, CheckoutService, CourierRateService, PriceChecker};

pub use errors::ApiResponse;

/// Services sharing one authenticated client, handed to whatever drives the checkout flow.
#[derive(Clone, Debug)]
pub struct Storefront {
    pub config: ClientConfig,
    pub client: TokenizedClient,
    pub carts: CartService,
    pub couriers: CourierRateService,
    pub pricing: Arc<PriceChecker>,
    pub checkout: CheckoutService,
}

impl Storefront {
    /// Validates `config` and wires every service to one shared client.
    pub fn new(config: ClientConfig, tokens: Arc<dyn TokenStore>) -> Result<Self, ClientError> {
        config.validate()?;
        let client = TokenizedClient::new(&config, tokens)?;

        Ok(Self {
            carts: CartService::new(client.clone()),
            couriers: CourierRateService::new(&config)?,
            pricing: Arc::new(PriceChecker::new(client.clone())),
            checkout: CheckoutService::new(client.clone()),
            client,
            config,
        })
    }

    pub fn tokens(&self) -> &Arc<dyn TokenStore> {
        self.client.tokens()
    }
}
