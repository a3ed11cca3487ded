use crate::allocation::{
    AllocationItem, AllocationResult, InvalidItemError, InvalidReason, Validator,
};
use crate::issue::Issue;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashSet;

/// What one selected student still owes.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingFee {
    pub student_id: String,
    pub pending_amount: Decimal,
    pub overdue_amount: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkSummary {
    pub students_count: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub late_fees: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub grand_total: Decimal,
}

fn items_of(selection: &[PendingFee]) -> (Vec<AllocationItem>, Vec<AllocationItem>) {
    selection
        .iter()
        .map(|s| {
            (
                AllocationItem::new(s.student_id.clone(), 1, s.pending_amount),
                AllocationItem::new(s.student_id.clone(), 1, s.overdue_amount),
            )
        })
        .unzip()
}

pub fn summarize_bulk(
    selection: &[PendingFee],
    validator: &Validator,
) -> Result<BulkSummary, InvalidItemError> {
    let (pending, overdue) = items_of(selection);
    let total_amount = validator.validate(&pending, Decimal::ZERO)?.computed_total;
    let late_fees = validator.validate(&overdue, Decimal::ZERO)?.computed_total;
    let grand_total = total_amount
        .checked_add(late_fees)
        .ok_or_else(|| InvalidItemError::new("grandTotal", InvalidReason::Overflow))?;
    Ok(BulkSummary {
        students_count: selection.len(),
        total_amount,
        late_fees,
        grand_total,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkReport {
    pub ok: bool,
    pub summary: BulkSummary,
    pub allocation: AllocationResult,
    pub issues: Vec<Issue>,
}

/// Checks that `collected` covers exactly what the selection owes.
pub fn check_bulk_payment(
    selection: &[PendingFee],
    collected: Decimal,
    validator: &Validator,
) -> Result<BulkReport, InvalidItemError> {
    let summary = summarize_bulk(selection, validator)?;
    let allocation = validator.validate(
        &[AllocationItem::new("grandTotal", 1, summary.grand_total)],
        collected,
    )?;

    let mut issues = Vec::new();
    if selection.is_empty() {
        issues.push(Issue::new(
            "no_students",
            "select at least one student for bulk payment",
        ));
    }
    let mut seen = HashSet::new();
    for s in selection {
        if !seen.insert(s.student_id.as_str()) {
            issues.push(Issue::for_label(
                "duplicate_student",
                s.student_id.clone(),
                "student is selected more than once",
            ));
        }
    }
    if let Some(msg) = allocation.message() {
        issues.push(Issue::new("collected_mismatch", msg));
    }

    Ok(BulkReport {
        ok: issues.is_empty(),
        summary,
        allocation,
        issues,
    })
}
