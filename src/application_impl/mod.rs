mod rotation_service_fake;
mod rotation_service_impl;
mod token_codec_impl;

pub use rotation_service_fake::*;
pub use rotation_service_impl::*;
pub use token_codec_impl::*;
