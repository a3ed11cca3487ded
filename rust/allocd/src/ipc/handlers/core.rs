use crate::ipc::error::ok;
use crate::ipc::helpers::{to_result, HandlerErr};
use crate::ipc::types::{AppState, Request};
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Health {
    version: &'static str,
    scale: u32,
    #[serde(with = "rust_decimal::serde::float")]
    default_total_marks: Decimal,
}

fn handle_health(state: &AppState) -> Result<serde_json::Value, HandlerErr> {
    to_result(&Health {
        version: env!("CARGO_PKG_VERSION"),
        scale: state.config.scale,
        default_total_marks: state.config.default_total_marks,
    })
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(match handle_health(state) {
            Ok(v) => ok(&req.id, v),
            Err(e) => e.response(&req.id),
        }),
        _ => None,
    }
}
