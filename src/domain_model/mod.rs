mod owner;
mod token;
mod window;

pub use owner::*;
pub use token::*;
pub use window::*;
