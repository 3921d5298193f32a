pub mod check;
pub mod token;
pub mod user;

pub use check::{Check, CheckMethod, Protocol};
pub use token::Token;
pub use user::User;
