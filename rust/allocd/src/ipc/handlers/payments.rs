use crate::ipc::error::ok;
use crate::ipc::helpers::{
    item_decimal_or_zero, label_of, required_array, required_decimal, to_result, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::payments::{check_bulk_payment, summarize_bulk, PendingFee};
use serde_json::Value;

fn parse_students(params: &Value) -> Result<Vec<PendingFee>, HandlerErr> {
    let raw = required_array(params, "students")?;
    let mut out = Vec::with_capacity(raw.len());
    for (i, v) in raw.iter().enumerate() {
        let student_id = label_of(v, "studentId", &format!("students[{i}]"))?;
        // Fee rows carry either pendingAmount or the older totalDue.
        let pending_key = if v.get("pendingAmount").is_some_and(|p| !p.is_null()) {
            "pendingAmount"
        } else {
            "totalDue"
        };
        out.push(PendingFee {
            pending_amount: item_decimal_or_zero(v, pending_key, &student_id)?,
            overdue_amount: item_decimal_or_zero(v, "overdueAmount", &student_id)?,
            student_id,
        });
    }
    Ok(out)
}

fn summarize(state: &AppState, req: &Request) -> Result<Value, HandlerErr> {
    let students = parse_students(&req.params)?;
    let summary = summarize_bulk(&students, &state.validator)?;
    to_result(&summary)
}

fn check(state: &AppState, req: &Request) -> Result<Value, HandlerErr> {
    let students = parse_students(&req.params)?;
    let collected = required_decimal(&req.params, "collected")?;
    let report = check_bulk_payment(&students, collected, &state.validator)?;
    to_result(&report)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let res = match req.method.as_str() {
        "payments.summarizeBulk" => summarize(state, req),
        "payments.checkBulk" => check(state, req),
        _ => return None,
    };
    Some(match res {
        Ok(v) => ok(&req.id, v),
        Err(e) => e.response(&req.id),
    })
}
