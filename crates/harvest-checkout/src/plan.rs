//! Plan Catalogue
//!
//! Plans are static: the storefront shows them, and picking one starts a
//! checkout for the plan's price.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{CheckoutError, Result};

/// A purchasable plan
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub name: String,

    /// Currency-prefixed price, e.g. `$8`
    pub price: String,

    /// Billing period label, e.g. `/ 30 Days`
    pub period: String,

    pub features: Vec<String>,

    #[serde(default)]
    pub popular: bool,
}

impl Plan {
    pub fn new(name: impl Into<String>, price: impl Into<String>, period: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            price: price.into(),
            period: period.into(),
            features: Vec::new(),
            popular: false,
        }
    }

    pub fn with_features<I, S>(mut self, features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.features = features.into_iter().map(Into::into).collect();
        self
    }

    pub fn popular(mut self) -> Self {
        self.popular = true;
        self
    }

    /// Numeric amount sent to the payment service (`$8` → 8)
    pub fn amount(&self) -> Result<Decimal> {
        let digits = self
            .price
            .trim()
            .trim_start_matches(|c: char| !c.is_ascii_digit() && c != '.' && c != '-')
            .replace(',', "");

        let amount = Decimal::from_str(&digits)
            .map_err(|_| CheckoutError::InvalidPrice(self.price.clone()))?;

        if amount <= Decimal::ZERO {
            return Err(CheckoutError::InvalidPrice(self.price.clone()));
        }
        Ok(amount)
    }
}

const SHARED_FEATURES: [&str; 3] = [
    "Full Bot Access",
    "All Elite Strategies",
    "Smart Wall Upgrader",
];

fn plan_with_support(name: &str, price: &str, period: &str, support: &str) -> Plan {
    Plan::new(name, price, period).with_features(
        SHARED_FEATURES
            .iter()
            .copied()
            .chain(std::iter::once(support)),
    )
}

/// The plans offered on the storefront, in display order
pub fn catalogue() -> Vec<Plan> {
    vec![
        plan_with_support("Weekly", "$2", "/ 7 Days", "Standard Support"),
        plan_with_support("Monthly", "$8", "/ 30 Days", "VIP Support").popular(),
        plan_with_support("Bi-Weekly", "$5", "/ 15 Days", "Priority Support"),
    ]
}

/// Look up a catalogue plan by name, ignoring case
pub fn find_plan(name: &str) -> Result<Plan> {
    catalogue()
        .into_iter()
        .find(|plan| plan.name.eq_ignore_ascii_case(name.trim()))
        .ok_or_else(|| CheckoutError::UnknownPlan(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_catalogue() {
        let plans = catalogue();
        assert_eq!(plans.len(), 3);
        assert_eq!(plans.iter().filter(|p| p.popular).count(), 1);
        assert!(plans.iter().all(|p| p.features.len() == 4));
    }

    #[test]
    fn test_amount_strips_currency() {
        assert_eq!(Plan::new("Monthly", "$8", "/ 30 Days").amount().unwrap(), dec!(8));
        assert_eq!(Plan::new("Odd", "€4.50", "").amount().unwrap(), dec!(4.50));
        assert_eq!(Plan::new("Big", "$1,200", "").amount().unwrap(), dec!(1200));
    }

    #[test]
    fn test_invalid_prices() {
        assert!(matches!(
            Plan::new("Free", "free", "").amount(),
            Err(CheckoutError::InvalidPrice(_))
        ));
        assert!(Plan::new("Zero", "$0", "").amount().is_err());
    }

    #[test]
    fn test_find_plan() {
        assert_eq!(find_plan("bi-weekly").unwrap().price, "$5");
        assert!(matches!(find_plan("yearly"), Err(CheckoutError::UnknownPlan(_))));
    }
}
