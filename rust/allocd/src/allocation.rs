use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use thiserror::Error;

/// Rounding scale used when callers don't configure one: currency minor units
/// and half-mark question weights both fit in two places.
pub const DEFAULT_SCALE: u32 = 2;

/// Upper bound on the configurable scale.
pub const MAX_SCALE: u32 = 6;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidReason {
    #[error("quantity must not be negative (got {0})")]
    NegativeQuantity(i64),
    #[error("unit value must not be negative (got {0})")]
    NegativeUnitValue(Decimal),
    #[error("{0} is not a number")]
    NonNumeric(String),
    #[error("quantity must be a whole number")]
    NonInteger,
    #[error("amount is too large to total")]
    Overflow,
}

impl InvalidReason {
    /// Stable machine code for the reason, used in IPC error details.
    pub fn code(&self) -> &'static str {
        match self {
            InvalidReason::NegativeQuantity(_) => "negative_quantity",
            InvalidReason::NegativeUnitValue(_) => "negative_unit_value",
            InvalidReason::NonNumeric(_) => "non_numeric",
            InvalidReason::NonInteger => "non_integer",
            InvalidReason::Overflow => "overflow",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid item \"{label}\": {reason}")]
pub struct InvalidItemError {
    pub label: String,
    pub reason: InvalidReason,
}

impl InvalidItemError {
    pub fn new(label: impl Into<String>, reason: InvalidReason) -> Self {
        Self {
            label: label.into(),
            reason,
        }
    }
}

/// One fee line or question section: `quantity` occurrences of `unit_value`.
///
/// Construction does not check signs; `validate` does, so an item built
/// straight from user input is reported by label instead of being rejected
/// somewhere upstream without context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationItem {
    pub label: String,
    pub quantity: i64,
    pub unit_value: Decimal,
}

impl AllocationItem {
    pub fn new(label: impl Into<String>, quantity: i64, unit_value: Decimal) -> Self {
        Self {
            label: label.into(),
            quantity,
            unit_value,
        }
    }

    /// Builds an item from a float amount. NaN and infinities have no decimal
    /// form and are rejected here.
    pub fn from_f64(
        label: impl Into<String>,
        quantity: i64,
        unit_value: f64,
    ) -> Result<Self, InvalidItemError> {
        let label = label.into();
        if !unit_value.is_finite() {
            return Err(InvalidItemError::new(
                label,
                InvalidReason::NonNumeric("unitValue".to_string()),
            ));
        }
        match Decimal::from_f64(unit_value) {
            Some(v) => Ok(Self::new(label, quantity, v)),
            None => Err(InvalidItemError::new(label, InvalidReason::Overflow)),
        }
    }

    fn check(&self) -> Result<(), InvalidItemError> {
        if self.quantity < 0 {
            return Err(InvalidItemError::new(
                self.label.clone(),
                InvalidReason::NegativeQuantity(self.quantity),
            ));
        }
        if self.unit_value < Decimal::ZERO {
            return Err(InvalidItemError::new(
                self.label.clone(),
                InvalidReason::NegativeUnitValue(self.unit_value),
            ));
        }
        Ok(())
    }

    fn subtotal(&self) -> Result<Decimal, InvalidItemError> {
        Decimal::from(self.quantity)
            .checked_mul(self.unit_value)
            .ok_or_else(|| InvalidItemError::new(self.label.clone(), InvalidReason::Overflow))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocationStatus {
    Balanced,
    Short(Decimal),
    Over(Decimal),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationResult {
    #[serde(with = "rust_decimal::serde::float")]
    pub computed_total: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub target: Decimal,
    pub is_valid: bool,
    #[serde(with = "rust_decimal::serde::float")]
    pub delta: Decimal,
}

impl AllocationResult {
    pub fn status(&self) -> AllocationStatus {
        if self.delta.is_zero() {
            AllocationStatus::Balanced
        } else if self.delta < Decimal::ZERO {
            AllocationStatus::Short(-self.delta)
        } else {
            AllocationStatus::Over(self.delta)
        }
    }

    /// User-facing mismatch text; `None` when the totals agree.
    pub fn message(&self) -> Option<String> {
        match self.status() {
            AllocationStatus::Balanced => None,
            AllocationStatus::Short(by) => Some(format!(
                "total must equal {}, currently short by {}",
                self.target.normalize(),
                by.normalize()
            )),
            AllocationStatus::Over(by) => Some(format!(
                "total must equal {}, currently over by {}",
                self.target.normalize(),
                by.normalize()
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Validator {
    scale: u32,
}

impl Default for Validator {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
        }
    }
}

impl Validator {
    /// Scales above `MAX_SCALE` are clamped.
    pub fn with_scale(scale: u32) -> Self {
        Self {
            scale: scale.min(MAX_SCALE),
        }
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn round(&self, v: Decimal) -> Decimal {
        v.round_dp_with_strategy(self.scale, RoundingStrategy::MidpointAwayFromZero)
    }

    /// Sums `quantity * unit_value` over `items` and compares with `target`.
    ///
    /// The first malformed item, in input order, fails the whole call.
    pub fn validate(
        &self,
        items: &[AllocationItem],
        target: Decimal,
    ) -> Result<AllocationResult, InvalidItemError> {
        let mut total = Decimal::ZERO;
        for item in items {
            item.check()?;
            let sub = item.subtotal()?;
            total = total
                .checked_add(sub)
                .ok_or_else(|| InvalidItemError::new(item.label.clone(), InvalidReason::Overflow))?;
        }

        let computed_total = self.round(total);
        let target = self.round(target);
        // The total is never negative, so only a target below
        // `computed_total - Decimal::MAX` lands here.
        let delta = computed_total
            .checked_sub(target)
            .ok_or_else(|| InvalidItemError::new("target", InvalidReason::Overflow))?;

        Ok(AllocationResult {
            computed_total,
            target,
            is_valid: delta.is_zero(),
            delta,
        })
    }
}

/// `Validator::default().validate(items, target)`.
pub fn validate(
    items: &[AllocationItem],
    target: Decimal,
) -> Result<AllocationResult, InvalidItemError> {
    Validator::default().validate(items, target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).expect("decimal literal")
    }

    fn item(label: &str, quantity: i64, unit_value: &str) -> AllocationItem {
        AllocationItem::new(label, quantity, d(unit_value))
    }

    #[test]
    fn three_sections_sum_to_target() {
        let items = vec![item("A", 5, "1"), item("B", 5, "1"), item("C", 5, "5")];
        let r = validate(&items, d("35")).expect("valid items");
        assert_eq!(r.computed_total, d("35"));
        assert!(r.is_valid);
        assert!(r.delta.is_zero());
        assert_eq!(r.status(), AllocationStatus::Balanced);
        assert_eq!(r.message(), None);
    }

    #[test]
    fn yearly_tuition_matches_and_mismatches() {
        let items = vec![item("Tuition", 12, "500")];
        assert!(validate(&items, d("6000")).expect("valid").is_valid);

        let r = validate(&items, d("6500")).expect("valid");
        assert!(!r.is_valid);
        assert_eq!(r.delta, d("-500"));
        assert_eq!(r.status(), AllocationStatus::Short(d("500")));
        assert_eq!(
            r.message().as_deref(),
            Some("total must equal 6500, currently short by 500")
        );
    }

    #[test]
    fn negative_quantity_names_the_item() {
        let items = vec![item("ok", 1, "1"), item("X", -1, "10")];
        let e = validate(&items, d("0")).expect_err("negative quantity");
        assert_eq!(e.label, "X");
        assert_eq!(e.reason, InvalidReason::NegativeQuantity(-1));
        assert_eq!(
            e.to_string(),
            "invalid item \"X\": quantity must not be negative (got -1)"
        );
    }

    #[test]
    fn negative_unit_value_is_rejected_not_summed() {
        let items = vec![item("Discount", 1, "-50")];
        let e = validate(&items, d("-50")).expect_err("negative unit value");
        assert_eq!(e.label, "Discount");
        assert_eq!(e.reason.code(), "negative_unit_value");
    }

    #[test]
    fn first_bad_item_wins() {
        let items = vec![item("first", -2, "1"), item("second", 1, "-1")];
        let e = validate(&items, Decimal::ZERO).expect_err("bad items");
        assert_eq!(e.label, "first");
    }

    #[test]
    fn empty_items_only_match_zero() {
        assert!(validate(&[], Decimal::ZERO).expect("empty").is_valid);
        let r = validate(&[], d("100")).expect("empty");
        assert!(!r.is_valid);
        assert_eq!(r.computed_total, Decimal::ZERO);
        assert_eq!(r.delta, d("-100"));
    }

    #[test]
    fn zero_quantity_and_zero_value_are_allowed() {
        let items = vec![item("unused", 0, "5"), item("free", 3, "0")];
        let r = validate(&items, Decimal::ZERO).expect("zeros are valid");
        assert!(r.is_valid);
    }

    #[test]
    fn decimal_amounts_do_not_drift() {
        // 0.1 * 3 is 0.30000000000000004 in binary floating point.
        let items = vec![item("a", 3, "0.1"), item("b", 1, "0.2")];
        let r = validate(&items, d("0.5")).expect("valid");
        assert!(r.is_valid, "{r:?}");
    }

    #[test]
    fn comparison_rounds_to_scale() {
        let items = vec![item("third", 3, "33.333")];
        let r = validate(&items, d("100")).expect("valid");
        assert_eq!(r.computed_total, d("100.00"));
        assert!(r.is_valid);

        let strict = Validator::with_scale(3).validate(&items, d("100")).expect("valid");
        assert!(!strict.is_valid);
        assert_eq!(strict.delta, d("-0.001"));
    }

    #[test]
    fn over_allocation_reports_over() {
        let items = vec![item("Exam", 2, "300")];
        let r = validate(&items, d("500")).expect("valid");
        assert_eq!(r.status(), AllocationStatus::Over(d("100")));
        assert_eq!(r.delta, r.computed_total - r.target);
    }

    #[test]
    fn validate_is_idempotent() {
        let items = vec![item("Tuition", 12, "512.25"), item("Exam", 2, "150")];
        let a = validate(&items, d("6447")).expect("valid");
        let b = validate(&items, d("6447")).expect("valid");
        assert_eq!(a, b);
    }

    #[test]
    fn from_f64_rejects_nan_and_infinity() {
        let e = AllocationItem::from_f64("Fee", 1, f64::NAN).expect_err("nan");
        assert_eq!(e.reason, InvalidReason::NonNumeric("unitValue".to_string()));
        assert!(AllocationItem::from_f64("Fee", 1, f64::INFINITY).is_err());

        let ok = AllocationItem::from_f64("Fee", 2, 12.5).expect("finite");
        assert_eq!(ok.unit_value, d("12.5"));
    }

    #[test]
    fn product_overflow_is_an_item_error() {
        let items = vec![AllocationItem::new("huge", i64::MAX, Decimal::MAX)];
        let e = validate(&items, Decimal::ZERO).expect_err("overflow");
        assert_eq!(e.label, "huge");
        assert_eq!(e.reason, InvalidReason::Overflow);
    }

    #[test]
    fn unrepresentable_delta_is_an_error() {
        let items = vec![item("a", 1, "1")];
        let e = validate(&items, -Decimal::MAX).expect_err("delta overflows");
        assert_eq!(e.label, "target");
        assert_eq!(e.reason, InvalidReason::Overflow);

        let r = validate(&[], -Decimal::MAX).expect("zero total");
        assert_eq!(r.delta, Decimal::MAX);
        assert_eq!(r.delta, r.computed_total - r.target);
    }

    #[test]
    fn scale_is_clamped() {
        assert_eq!(Validator::with_scale(40).scale(), MAX_SCALE);
        assert_eq!(Validator::default().scale(), DEFAULT_SCALE);
    }
}
