mod session;
mod upload;

pub use session::*;
pub use upload::*;
