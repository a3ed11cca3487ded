use crate::allocation::{
    AllocationItem, AllocationResult, InvalidItemError, InvalidReason, Validator,
};
use crate::issue::Issue;
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Frequency {
    Monthly,
    Semester,
    Yearly,
    OneTime,
}

impl Frequency {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monthly" => Some(Frequency::Monthly),
            "semester" => Some(Frequency::Semester),
            "yearly" => Some(Frequency::Yearly),
            "one-time" | "one_time" | "onetime" => Some(Frequency::OneTime),
            _ => None,
        }
    }

    /// Billing occurrences within a period of `months` months.
    pub fn occurrences(self, months: i64) -> i64 {
        match self {
            Frequency::Monthly => months,
            Frequency::Semester => (months + 5) / 6,
            Frequency::Yearly => (months + 11) / 12,
            Frequency::OneTime => 1,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum FeeError {
    #[error("bad period: {0}")]
    BadPeriod(String),
    #[error("fee line \"{0}\" needs a quantity or a billing period")]
    MissingQuantity(String),
    #[error(transparent)]
    InvalidItem(#[from] InvalidItemError),
}

/// Inclusive range of calendar months, `YYYY-MM` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillingPeriod {
    start: NaiveDate,
    end: NaiveDate,
}

impl BillingPeriod {
    pub fn parse(start: &str, end: &str) -> Result<Self, FeeError> {
        let start = parse_month(start)?;
        let end = parse_month(end)?;
        if end < start {
            return Err(FeeError::BadPeriod(format!(
                "end {} is before start {}",
                end.format("%Y-%m"),
                start.format("%Y-%m")
            )));
        }
        Ok(Self { start, end })
    }

    pub fn months(&self) -> i64 {
        let a = i64::from(self.start.year()) * 12 + i64::from(self.start.month0());
        let b = i64::from(self.end.year()) * 12 + i64::from(self.end.month0());
        b - a + 1
    }
}

fn parse_month(s: &str) -> Result<NaiveDate, FeeError> {
    NaiveDate::parse_from_str(&format!("{}-01", s.trim()), "%Y-%m-%d")
        .map_err(|_| FeeError::BadPeriod(format!("expected YYYY-MM, got {s:?}")))
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeeLine {
    pub fee_type: String,
    pub amount: Decimal,
    pub discount: Decimal,
    pub frequency: Frequency,
    pub quantity: Option<i64>,
}

impl FeeLine {
    pub fn new(fee_type: impl Into<String>, amount: Decimal, frequency: Frequency) -> Self {
        Self {
            fee_type: fee_type.into(),
            amount,
            discount: Decimal::ZERO,
            frequency,
            quantity: None,
        }
    }

    fn quantity_in(&self, period: Option<&BillingPeriod>) -> Result<i64, FeeError> {
        if let Some(q) = self.quantity {
            return Ok(q);
        }
        match (self.frequency, period) {
            (Frequency::OneTime, _) => Ok(1),
            (f, Some(p)) => Ok(f.occurrences(p.months())),
            (_, None) => Err(FeeError::MissingQuantity(self.fee_type.clone())),
        }
    }

    /// Amount charged per occurrence after discount.
    pub fn net_amount(&self) -> Result<Decimal, InvalidItemError> {
        if self.discount < Decimal::ZERO {
            return Err(InvalidItemError::new(
                self.fee_type.clone(),
                InvalidReason::NegativeUnitValue(self.discount),
            ));
        }
        self.amount
            .checked_sub(self.discount)
            .ok_or_else(|| InvalidItemError::new(self.fee_type.clone(), InvalidReason::Overflow))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineBreakdown {
    pub fee_type: String,
    pub frequency: Frequency,
    pub quantity: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub net_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleReport {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub months: Option<i64>,
    pub allocation: AllocationResult,
    pub lines: Vec<LineBreakdown>,
    pub issues: Vec<Issue>,
}

/// Totals a fee schedule over `period` and compares it with `target`.
pub fn check_fee_schedule(
    lines: &[FeeLine],
    period: Option<&BillingPeriod>,
    target: Decimal,
    validator: &Validator,
) -> Result<ScheduleReport, FeeError> {
    let mut items = Vec::with_capacity(lines.len());
    let mut issues = Vec::new();
    for line in lines {
        if line.amount <= Decimal::ZERO {
            issues.push(Issue::for_label(
                "non_positive_amount",
                line.fee_type.clone(),
                "amount must be greater than zero",
            ));
        }
        items.push(AllocationItem::new(
            line.fee_type.clone(),
            line.quantity_in(period)?,
            line.net_amount()?,
        ));
    }

    let allocation = validator.validate(&items, target)?;
    if let Some(msg) = allocation.message() {
        issues.push(Issue::new("total_mismatch", msg));
    }

    let lines = lines
        .iter()
        .zip(items)
        .map(|(line, item)| LineBreakdown {
            fee_type: item.label,
            frequency: line.frequency,
            quantity: item.quantity,
            net_amount: item.unit_value,
            subtotal: Decimal::from(item.quantity) * item.unit_value,
        })
        .collect();

    Ok(ScheduleReport {
        ok: issues.is_empty(),
        months: period.map(BillingPeriod::months),
        allocation,
        lines,
        issues,
    })
}
