use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::CartLineItem;

/// Cart lines belonging to one merchant, with a locally estimated subtotal.
///
/// `total_cost` is a client-side estimate; once a price check has been made,
/// its totals take precedence for anything shown at checkout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MerchantGroup {
    pub merchant_id: u64,
    pub merchant_name: String,
    pub city_id: u64,
    pub photo: String,
    pub total_weight: f64,
    pub total_cost: Decimal,
    pub courier_id: Option<String>,
    pub courier_cost: Decimal,
    pub items: Vec<CartLineItem>,
}

impl MerchantGroup {
    fn start(item: &CartLineItem) -> Self {
        Self {
            merchant_id: item.merchant_id,
            merchant_name: item.merchant_name.clone(),
            city_id: item.city_id,
            photo: item.photo.clone(),
            total_weight: 0.0,
            total_cost: Decimal::ZERO,
            courier_id: None,
            courier_cost: Decimal::ZERO,
            items: Vec::new(),
        }
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn has_courier(&self) -> bool {
        self.courier_id.is_some()
    }

    /// Subtotal plus the selected courier's cost.
    pub fn estimated_total(&self) -> Decimal {
        self.total_cost.saturating_add(self.courier_cost)
    }
}

/// Group cart lines by merchant, keeping merchants in first-seen order.
///
/// `total_weight` sums item weights; `total_cost` sums `trunc(price × amount)`
/// per item, saturating at `Decimal::MAX`. Every input item lands in exactly
/// one group. Empty input yields no groups.
pub fn group_by_merchant(items: &[CartLineItem]) -> Vec<MerchantGroup> {
    let mut groups: IndexMap<u64, MerchantGroup> = IndexMap::new();

    for item in items {
        let group = groups
            .entry(item.merchant_id)
            .or_insert_with(|| MerchantGroup::start(item));

        group.total_weight += item.weight;
        group.total_cost = group.total_cost.saturating_add(item.line_cost());
        group.items.push(item.clone());
    }

    groups.into_values().collect()
}

/// Return `groups` with the courier for `merchant_id` set. Other merchants are untouched.
pub fn select_courier(
    groups: Vec<MerchantGroup>,
    merchant_id: u64,
    courier_id: impl Into<String>,
    cost: Decimal,
) -> Vec<MerchantGroup> {
    let courier_id = courier_id.into();
    groups
        .into_iter()
        .map(|group| {
            if group.merchant_id == merchant_id {
                MerchantGroup {
                    courier_id: Some(courier_id.clone()),
                    courier_cost: cost,
                    ..group
                }
            } else {
                group
            }
        })
        .collect()
}

/// Σ(subtotal + courier cost) across all merchants.
pub fn estimated_total(groups: &[MerchantGroup]) -> Decimal {
    saturating_sum(groups.iter().map(MerchantGroup::estimated_total))
}

/// Σ courier cost across all merchants.
pub fn total_courier_cost(groups: &[MerchantGroup]) -> Decimal {
    saturating_sum(groups.iter().map(|g| g.courier_cost))
}

fn saturating_sum(values: impl Iterator<Item = Decimal>) -> Decimal {
    values.fold(Decimal::ZERO, Decimal::saturating_add)
}
