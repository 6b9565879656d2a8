use crate::domain_model::{TokenValue, WindowHours};
use chrono::{DateTime, Utc};

pub trait TokenCodec: Send + Sync {
    /// Fresh unguessable value. An exhausted entropy source is a process
    /// defect, so there is no error path here.
    fn generate(&self) -> TokenValue;

    fn expiry_from(&self, now: DateTime<Utc>, window: WindowHours) -> DateTime<Utc> {
        window.expires_after(now)
    }
}
