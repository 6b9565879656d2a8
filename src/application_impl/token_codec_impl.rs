use crate::application_port::TokenCodec;
use crate::domain_model::TokenValue;

/// Random v4 UUIDs, drawn from the OS entropy source.
#[derive(Debug, Default)]
pub struct UuidTokenCodec;

impl UuidTokenCodec {
    pub fn new() -> Self {
        Self
    }
}

impl TokenCodec for UuidTokenCodec {
    fn generate(&self) -> TokenValue {
        TokenValue(uuid::Uuid::new_v4().to_string())
    }
}
