pub mod parser;
pub mod validator;

pub use parser::extract_price;
pub use validator::PriceBand;
