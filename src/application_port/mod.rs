mod rotation_service;
mod token_codec;

pub use rotation_service::*;
pub use token_codec::*;
