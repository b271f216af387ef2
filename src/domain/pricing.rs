//! Item prices, delivery fee and order total.
//!
//! All amounts are `BigDecimal` rounded to two decimal places, half-up.

use bigdecimal::{BigDecimal, FromPrimitive, RoundingMode, Zero};
use chrono::NaiveDate;

use super::catalog::{Promotion, PromotionKind};

/// Tariff used to price delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryTariff {
    pub base_fee: BigDecimal,
    pub per_km_rate: BigDecimal,
}

impl Default for DeliveryTariff {
    fn default() -> Self {
        Self {
            base_fee: BigDecimal::from(5),
            per_km_rate: BigDecimal::from(2),
        }
    }
}

/// The promotion that won for a line, with the price it replaced.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedPromotion {
    pub name: String,
    pub original_price: BigDecimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EffectivePrice {
    pub unit_price: BigDecimal,
    pub promotion: Option<AppliedPromotion>,
}

pub fn round_money(amount: &BigDecimal) -> BigDecimal {
    amount.with_scale_round(2, RoundingMode::HalfUp)
}

impl PromotionKind {
    /// Price after this promotion, floored at zero.
    pub fn discounted_price(&self, base_price: &BigDecimal) -> BigDecimal {
        let discounted = match self {
            PromotionKind::Percentage(pct) => {
                let discount = round_money(&(base_price * pct / BigDecimal::from(100)));
                base_price - discount
            }
            PromotionKind::FixedAmount(amount) => base_price - amount,
        };
        if discounted < BigDecimal::zero() {
            round_money(&BigDecimal::zero())
        } else {
            round_money(&discounted)
        }
    }
}

/// Cheapest price among the promotions current on `today`, or the base price.
///
/// Promotions compete on the price they produce, not on their nominal
/// discount. On a tie the earlier promotion wins.
pub fn effective_price(
    base_price: &BigDecimal,
    promotions: &[Promotion],
    today: NaiveDate,
) -> EffectivePrice {
    let mut best: Option<(&Promotion, BigDecimal)> = None;
    for promotion in promotions.iter().filter(|p| p.is_current(today)) {
        let price = promotion.kind.discounted_price(base_price);
        if best.as_ref().map_or(true, |(_, current)| price < *current) {
            best = Some((promotion, price));
        }
    }

    match best {
        Some((promotion, unit_price)) => EffectivePrice {
            unit_price,
            promotion: Some(AppliedPromotion {
                name: promotion.name.clone(),
                original_price: round_money(base_price),
            }),
        },
        None => EffectivePrice {
            unit_price: round_money(base_price),
            promotion: None,
        },
    }
}

/// `base_fee + per_km_rate * distance`; degenerate distances pay the base fee.
pub fn delivery_fee(distance_km: f64, tariff: &DeliveryTariff) -> BigDecimal {
    match BigDecimal::from_f64(distance_km) {
        Some(distance) if distance_km > 0.0 => {
            round_money(&(&tariff.base_fee + &tariff.per_km_rate * distance))
        }
        _ => round_money(&tariff.base_fee),
    }
}

pub fn line_subtotal(unit_price: &BigDecimal, quantity: i32) -> BigDecimal {
    round_money(&(unit_price * BigDecimal::from(quantity)))
}

/// Sum of subtotals plus fee minus discount, never below zero.
pub fn order_total<'a>(
    subtotals: impl IntoIterator<Item = &'a BigDecimal>,
    delivery_fee: &BigDecimal,
    discount: Option<&BigDecimal>,
) -> BigDecimal {
    let gross = subtotals
        .into_iter()
        .fold(delivery_fee.clone(), |acc, subtotal| acc + subtotal);
    let total = match discount {
        Some(discount) => gross - discount,
        None => gross,
    };
    if total < BigDecimal::zero() {
        round_money(&BigDecimal::zero())
    } else {
        round_money(&total)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use uuid::Uuid;

    use super::*;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).expect("valid decimal")
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn promo(name: &str, kind: PromotionKind) -> Promotion {
        Promotion {
            id: Uuid::new_v4(),
            name: name.to_string(),
            kind,
            is_active: true,
            starts_on: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            ends_on: NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
        }
    }

    #[test]
    fn no_promotion_charges_base_price() {
        let price = effective_price(&dec("45.00"), &[], today());
        assert_eq!(price.unit_price, dec("45.00"));
        assert!(price.promotion.is_none());
    }

    #[test]
    fn cheapest_competing_promotion_wins() {
        let promotions = vec![
            promo("Cinco off", PromotionKind::FixedAmount(dec("5.00"))),
            promo("28 por cento", PromotionKind::Percentage(dec("28"))),
        ];
        let price = effective_price(&dec("25.00"), &promotions, today());
        assert_eq!(price.unit_price, dec("18.00"));
        let applied = price.promotion.expect("promotion applied");
        assert_eq!(applied.name, "28 por cento");
        assert_eq!(applied.original_price, dec("25.00"));
    }

    #[test]
    fn fixed_amount_can_beat_higher_percentage() {
        // 50% of 10.00 = 5.00 vs 7.00 off = 3.00
        let promotions = vec![
            promo("Metade", PromotionKind::Percentage(dec("50"))),
            promo("Sete reais", PromotionKind::FixedAmount(dec("7.00"))),
        ];
        let price = effective_price(&dec("10.00"), &promotions, today());
        assert_eq!(price.unit_price, dec("3.00"));
        assert_eq!(price.promotion.unwrap().name, "Sete reais");
    }

    #[test]
    fn expired_promotion_is_ignored() {
        let mut old = promo("Velha", PromotionKind::FixedAmount(dec("5.00")));
        old.ends_on = NaiveDate::from_ymd_opt(2024, 6, 14).unwrap();
        let price = effective_price(&dec("25.00"), &[old], today());
        assert_eq!(price.unit_price, dec("25.00"));
        assert!(price.promotion.is_none());
    }

    #[test]
    fn discount_never_goes_below_zero() {
        let kind = PromotionKind::FixedAmount(dec("30.00"));
        assert_eq!(kind.discounted_price(&dec("25.00")), dec("0.00"));
    }

    #[test]
    fn percentage_discount_rounds_half_up() {
        // 15% of 9.99 = 1.4985 -> 1.50
        let kind = PromotionKind::Percentage(dec("15"));
        assert_eq!(kind.discounted_price(&dec("9.99")), dec("8.49"));
    }

    #[test]
    fn delivery_fee_at_zero_distance_is_base_fee() {
        assert_eq!(delivery_fee(0.0, &DeliveryTariff::default()), dec("5.00"));
        assert_eq!(delivery_fee(-1.0, &DeliveryTariff::default()), dec("5.00"));
    }

    #[test]
    fn delivery_fee_grows_per_km() {
        let tariff = DeliveryTariff::default();
        assert_eq!(delivery_fee(2.0, &tariff), dec("9.00"));
        assert_eq!(delivery_fee(10.0, &tariff), dec("25.00"));
    }

    #[test]
    fn delivery_fee_rounds_to_cents() {
        // 5.00 + 2.00 * 3.337 = 11.674
        assert_eq!(delivery_fee(3.337, &DeliveryTariff::default()), dec("11.67"));
    }

    #[test]
    fn subtotal_is_unit_price_times_quantity() {
        assert_eq!(line_subtotal(&dec("45.00"), 2), dec("90.00"));
        assert_eq!(line_subtotal(&dec("0.10"), 3), dec("0.30"));
    }

    #[test]
    fn total_adds_fee_and_subtracts_discount() {
        let subtotals = [dec("90.00"), dec("12.50")];
        let total = order_total(subtotals.iter(), &dec("9.00"), Some(&dec("10.00")));
        assert_eq!(total, dec("101.50"));
    }

    #[test]
    fn total_is_floored_at_zero() {
        let subtotals = [dec("10.00")];
        let total = order_total(subtotals.iter(), &dec("5.00"), Some(&dec("50.00")));
        assert_eq!(total, dec("0.00"));
    }
}
