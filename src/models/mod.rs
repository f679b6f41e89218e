pub mod attribute;
pub mod request;
pub mod response;

pub use attribute::*;
pub use request::*;
pub use response::*;
