use rust_decimal::Decimal;
use serde::Serialize;

use crate::{
    errors::ClientError,
    models::{CartLineItem, CartSnapshot, MerchantCourierSelection, PriceCheckRequest, PriceCheckResult},
    services::commerce::cart_aggregator::{self, MerchantGroup},
};

/// State transitions applied to a [`CartState`].
#[derive(Clone, Debug, PartialEq)]
pub enum CartAction {
    /// A fresh snapshot from the backend replaces everything local.
    Loaded(CartSnapshot),
    QuantityChanged { cart_product_id: u64, quantity: u32 },
    ItemRemoved(u64),
    CourierSelected {
        merchant_id: u64,
        courier_id: String,
        cost: Decimal,
    },
    PriceChecked(PriceCheckResult),
    PromoSelected(Option<u64>),
    Cleared,
}

/// Everything the checkout flow knows about the shopper's cart.
///
/// Values are replaced rather than mutated: [`CartState::reduce`] consumes the
/// current state and returns the next one.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CartState {
    pub cart_id: Option<u64>,
    pub total: Option<Decimal>,
    pub items: Vec<CartLineItem>,
    pub groups: Vec<MerchantGroup>,
    pub checked_price: Option<PriceCheckResult>,
    pub selected_promo: Option<u64>,
}

impl CartState {
    pub fn from_snapshot(snapshot: CartSnapshot) -> Self {
        Self::default().reduce(CartAction::Loaded(snapshot))
    }

    pub fn reduce(self, action: CartAction) -> CartState {
        match action {
            CartAction::Loaded(snapshot) => {
                let mut items = snapshot.products;
                items.sort_by_key(|item| item.merchant_id);
                let groups = cart_aggregator::group_by_merchant(&items);

                CartState {
                    cart_id: Some(snapshot.id),
                    total: snapshot.total,
                    items,
                    groups,
                    checked_price: None,
                    selected_promo: self.selected_promo,
                }
            }
            CartAction::QuantityChanged {
                cart_product_id,
                quantity,
            } => {
                let items = self
                    .items
                    .iter()
                    .cloned()
                    .map(|item| {
                        if item.cart_product_id == cart_product_id {
                            CartLineItem {
                                amount: quantity.max(1),
                                ..item
                            }
                        } else {
                            item
                        }
                    })
                    .collect();
                self.with_items(items)
            }
            CartAction::ItemRemoved(cart_product_id) => {
                let items = self
                    .items
                    .iter()
                    .filter(|item| item.cart_product_id != cart_product_id)
                    .cloned()
                    .collect();
                self.with_items(items)
            }
            CartAction::CourierSelected {
                merchant_id,
                courier_id,
                cost,
            } => CartState {
                groups: cart_aggregator::select_courier(self.groups, merchant_id, courier_id, cost),
                checked_price: None,
                ..self
            },
            CartAction::PriceChecked(result) => CartState {
                checked_price: Some(result),
                ..self
            },
            CartAction::PromoSelected(promo) => CartState {
                selected_promo: promo,
                checked_price: None,
                ..self
            },
            CartAction::Cleared => CartState::default(),
        }
    }

    // Regroups after a local edit. Merchants that are still present keep their courier.
    fn with_items(self, items: Vec<CartLineItem>) -> CartState {
        let groups = cart_aggregator::group_by_merchant(&items)
            .into_iter()
            .map(|group| {
                match self
                    .groups
                    .iter()
                    .find(|previous| previous.merchant_id == group.merchant_id)
                {
                    Some(previous) => MerchantGroup {
                        courier_id: previous.courier_id.clone(),
                        courier_cost: previous.courier_cost,
                        ..group
                    },
                    None => group,
                }
            })
            .collect();

        CartState {
            items,
            groups,
            checked_price: None,
            ..self
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// True once every merchant in the cart has a courier.
    pub fn ready_for_price_check(&self) -> bool {
        !self.groups.is_empty() && self.groups.iter().all(MerchantGroup::has_courier)
    }

    /// Builds the price-check payload from the selected couriers and promo.
    ///
    /// # Errors
    ///
    /// `Validation` when no cart is loaded, the cart is empty, or a merchant
    /// has no courier selected.
    pub fn price_check_request(&self, address_id: u64) -> Result<PriceCheckRequest, ClientError> {
        let cart_id = self
            .cart_id
            .ok_or_else(|| ClientError::Validation("no cart loaded".into()))?;
        if self.groups.is_empty() {
            return Err(ClientError::Validation("cart is empty".into()));
        }

        let merchant = self
            .groups
            .iter()
            .map(|group| match &group.courier_id {
                Some(courier_id) => Ok(MerchantCourierSelection {
                    merchant_id: group.merchant_id,
                    courier_id: courier_id.clone(),
                    courier_price: group.courier_cost,
                }),
                None => Err(ClientError::Validation(format!(
                    "no courier selected for {}",
                    group.merchant_name
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PriceCheckRequest {
            cart_id,
            address_id,
            voucher_id: self.selected_promo,
            merchant,
        })
    }

    /// The price-checked total when one is known, else the local estimate.
    pub fn display_total(&self) -> Decimal {
        match &self.checked_price {
            Some(checked) => checked.total_price,
            None => cart_aggregator::estimated_total(&self.groups),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::commerce::cart_aggregator::test_support::line;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;

    fn snapshot() -> CartSnapshot {
        CartSnapshot {
            id: 9,
            total: Some(dec!(4500)),
            products: vec![
                line(1, 2, dec!(1000), 2, 1.0),
                line(2, 1, dec!(500), 1, 2.0),
                line(3, 2, dec!(1500), 1, 1.5),
            ],
        }
    }

    fn priced(total: Decimal) -> PriceCheckResult {
        PriceCheckResult {
            total_price: total,
            discount: None,
            cut_price: None,
            cutted_price: None,
            initial_price: None,
            merchant: Vec::new(),
        }
    }

    #[test]
    fn loading_sorts_items_by_merchant_and_groups_them() {
        let state = CartState::from_snapshot(snapshot());

        let merchants: Vec<u64> = state.items.iter().map(|i| i.merchant_id).collect();
        assert_eq!(merchants, vec![1, 2, 2]);
        assert_eq!(state.groups.len(), 2);
        assert_eq!(state.groups[0].merchant_id, 1);
        assert_eq!(state.groups[1].total_cost, dec!(3500));
        assert_eq!(state.display_total(), dec!(4000));
    }

    #[test]
    fn reloading_resets_couriers_and_checked_price() {
        let state = CartState::from_snapshot(snapshot())
            .reduce(CartAction::CourierSelected {
                merchant_id: 1,
                courier_id: "jne".into(),
                cost: dec!(9000),
            })
            .reduce(CartAction::PriceChecked(priced(dec!(1))))
            .reduce(CartAction::Loaded(snapshot()));

        assert!(state.groups.iter().all(|g| !g.has_courier()));
        assert!(state.checked_price.is_none());
    }

    #[test]
    fn checked_price_takes_precedence_over_estimate() {
        let state = CartState::from_snapshot(snapshot())
            .reduce(CartAction::PriceChecked(priced(dec!(3999))));

        assert_eq!(state.display_total(), dec!(3999));
    }

    #[test]
    fn quantity_change_regroups_and_keeps_couriers() {
        let state = CartState::from_snapshot(snapshot())
            .reduce(CartAction::CourierSelected {
                merchant_id: 2,
                courier_id: "sicepat".into(),
                cost: dec!(7000),
            })
            .reduce(CartAction::PriceChecked(priced(dec!(1))))
            .reduce(CartAction::QuantityChanged {
                cart_product_id: 1,
                quantity: 0,
            });

        let group = &state.groups[1];
        assert_eq!(group.total_cost, dec!(2500));
        assert_eq!(group.courier_id.as_deref(), Some("sicepat"));
        assert!(state.checked_price.is_none());
    }

    #[test]
    fn raising_quantity_past_representable_cost_saturates() {
        let state = CartState::from_snapshot(CartSnapshot {
            id: 3,
            total: None,
            products: vec![line(1, 1, dec!(7922816251426433759354395033.5), 1, 1.0)],
        })
        .reduce(CartAction::QuantityChanged {
            cart_product_id: 1,
            quantity: u32::MAX,
        });

        assert_eq!(state.groups[0].total_cost, Decimal::MAX);
        assert_eq!(state.display_total(), Decimal::MAX);
    }

    #[test]
    fn removing_last_item_of_a_merchant_drops_its_group() {
        let state = CartState::from_snapshot(snapshot()).reduce(CartAction::ItemRemoved(2));

        assert_eq!(state.groups.len(), 1);
        assert_eq!(state.groups[0].merchant_id, 2);
        assert_eq!(state.items.len(), 2);
    }

    #[test]
    fn price_check_request_requires_every_courier() {
        let state = CartState::from_snapshot(snapshot()).reduce(CartAction::CourierSelected {
            merchant_id: 1,
            courier_id: "jne".into(),
            cost: dec!(9000),
        });

        assert!(!state.ready_for_price_check());
        assert_matches!(state.price_check_request(5), Err(ClientError::Validation(_)));
    }

    #[test]
    fn price_check_request_carries_selections_and_promo() {
        let state = CartState::from_snapshot(snapshot())
            .reduce(CartAction::CourierSelected {
                merchant_id: 1,
                courier_id: "jne".into(),
                cost: dec!(9000),
            })
            .reduce(CartAction::CourierSelected {
                merchant_id: 2,
                courier_id: "tiki".into(),
                cost: dec!(11000),
            })
            .reduce(CartAction::PromoSelected(Some(77)));

        let request = state.price_check_request(5).expect("request should build");

        assert_eq!(request.cart_id, 9);
        assert_eq!(request.address_id, 5);
        assert_eq!(request.voucher_id, Some(77));
        assert_eq!(request.merchant.len(), 2);
        assert_eq!(request.merchant[1].courier_price, dec!(11000));
        assert_eq!(state.display_total(), dec!(24000));
    }

    #[test]
    fn empty_cart_cannot_be_price_checked() {
        let state = CartState::from_snapshot(CartSnapshot {
            id: 1,
            total: None,
            products: Vec::new(),
        });

        assert!(state.is_empty());
        assert_matches!(state.price_check_request(1), Err(ClientError::Validation(_)));
        assert_matches!(
            CartState::default().price_check_request(1),
            Err(ClientError::Validation(_))
        );
    }

    #[test]
    fn clearing_returns_to_default() {
        let state = CartState::from_snapshot(snapshot()).reduce(CartAction::Cleared);
        assert_eq!(state, CartState::default());
    }
}
