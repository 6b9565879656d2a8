mod error;
mod handler;
mod router;

pub use error::*;
pub use handler::{ApiResponse, VerifyResponse};
pub use router::{OWNER_HEADER, routes};
