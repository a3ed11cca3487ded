use crate::allocation::{AllocationItem, AllocationStatus};
use crate::ipc::error::ok;
use crate::ipc::helpers::{
    item_decimal, item_quantity, label_of, required_array, required_decimal, to_result,
    HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn parse_items(params: &serde_json::Value) -> Result<Vec<AllocationItem>, HandlerErr> {
    let raw = required_array(params, "items")?;
    let mut items = Vec::with_capacity(raw.len());
    for (i, v) in raw.iter().enumerate() {
        let label = label_of(v, "label", &format!("items[{i}]"))?;
        let quantity = item_quantity(v, "quantity", &label)?;
        let unit_value = item_decimal(v, "unitValue", &label)?;
        items.push(AllocationItem::new(label, quantity, unit_value));
    }
    Ok(items)
}

fn validate(state: &AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let items = parse_items(&req.params)?;
    let target = required_decimal(&req.params, "target")?;
    let result = state.validator.validate(&items, target)?;

    let mut out = to_result(&result)?;
    out["status"] = json!(match result.status() {
        AllocationStatus::Balanced => "balanced",
        AllocationStatus::Short(_) => "short",
        AllocationStatus::Over(_) => "over",
    });
    out["message"] = json!(result.message());
    Ok(out)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "allocation.validate" => Some(match validate(state, req) {
            Ok(v) => ok(&req.id, v),
            Err(e) => e.response(&req.id),
        }),
        _ => None,
    }
}
