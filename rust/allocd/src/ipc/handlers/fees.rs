use crate::fees::{check_fee_schedule, BillingPeriod, FeeLine, Frequency};
use crate::ipc::error::ok;
use crate::ipc::helpers::{
    item_decimal, item_decimal_or_zero, item_quantity, label_of, required_array,
    required_decimal, required_str, to_result, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use serde_json::{json, Value};

fn parse_period(v: &Value) -> Result<BillingPeriod, HandlerErr> {
    let start = required_str(v, "start")?;
    let end = required_str(v, "end")?;
    Ok(BillingPeriod::parse(start, end)?)
}

fn parse_line(v: &Value, i: usize) -> Result<FeeLine, HandlerErr> {
    let fee_type = label_of(v, "feeType", &format!("lines[{i}]"))?;
    let frequency = match v.get("frequency") {
        None | Some(Value::Null) => Frequency::Monthly,
        Some(f) => f.as_str().and_then(Frequency::parse).ok_or_else(|| {
            HandlerErr::bad_params(format!(
                "unknown frequency for \"{fee_type}\": {f} (expected monthly, semester, yearly, one-time)"
            ))
        })?,
    };
    let quantity = match v.get("quantity") {
        None | Some(Value::Null) => None,
        Some(_) => Some(item_quantity(v, "quantity", &fee_type)?),
    };
    Ok(FeeLine {
        amount: item_decimal(v, "amount", &fee_type)?,
        discount: item_decimal_or_zero(v, "discount", &fee_type)?,
        frequency,
        quantity,
        fee_type,
    })
}

fn check_schedule(state: &AppState, req: &Request) -> Result<Value, HandlerErr> {
    let lines = required_array(&req.params, "lines")?
        .iter()
        .enumerate()
        .map(|(i, v)| parse_line(v, i))
        .collect::<Result<Vec<_>, _>>()?;
    let period = match req.params.get("period") {
        None | Some(Value::Null) => None,
        Some(p) => Some(parse_period(p)?),
    };
    let target = required_decimal(&req.params, "target")?;

    let report = check_fee_schedule(&lines, period.as_ref(), target, &state.validator)?;
    to_result(&report)
}

fn months_in_period(req: &Request) -> Result<Value, HandlerErr> {
    let period = parse_period(&req.params)?;
    Ok(json!({ "months": period.months() }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let res = match req.method.as_str() {
        "fees.checkSchedule" => check_schedule(state, req),
        "fees.monthsInPeriod" => months_in_period(req),
        _ => return None,
    };
    Some(match res {
        Ok(v) => ok(&req.id, v),
        Err(e) => e.response(&req.id),
    })
}
