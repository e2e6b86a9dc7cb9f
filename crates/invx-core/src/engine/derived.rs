//! Unit cost and tentative price.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::config::{PricingConfig, UnitCostBasis};
use crate::models::line_item::InvoiceLineItem;

/// Round half-up to two decimal places.
pub fn round_currency(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Fields computed from an extracted line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedFields {
    pub unit_cost: Decimal,
    pub tentative_price: Decimal,
}

/// Compute unit cost and tentative price.
///
/// `units_per_packet` is non-zero by type, so the division cannot fail.
pub fn compute_derived(item: &InvoiceLineItem, pricing: &PricingConfig) -> DerivedFields {
    let units = Decimal::from(item.units_per_packet.get());
    let basis = match pricing.unit_cost_basis {
        UnitCostBasis::PerPacket => item.cost_per_packet,
        UnitCostBasis::TotalCost => item.total_cost,
    };
    let unit_cost = round_currency(basis / units);

    let tentative_price = if item.purchased_qty > Decimal::ZERO {
        round_currency(
            unit_cost
                .saturating_mul(item.purchased_qty)
                .saturating_mul(pricing.markup),
        )
    } else {
        round_currency(item.cost_per_packet.saturating_mul(pricing.markup))
    };

    DerivedFields {
        unit_cost,
        tentative_price,
    }
}

/// Return `item` with its derived fields filled in.
pub fn apply_derived(item: InvoiceLineItem, pricing: &PricingConfig) -> InvoiceLineItem {
    let derived = compute_derived(&item, pricing);
    InvoiceLineItem {
        unit_cost: derived.unit_cost,
        tentative_price: derived.tentative_price,
        ..item
    }
}
