use crate::allocation::Validator;
use crate::config::Config;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub config: Config,
    pub validator: Validator,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let validator = config.validator();
        Self { config, validator }
    }
}
