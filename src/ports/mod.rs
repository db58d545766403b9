pub mod auth_api;
pub mod book_api;
pub mod borrow_api;
pub mod error;
pub mod favorite_api;
pub mod message_api;
pub mod review_api;
pub mod user_api;

pub use auth_api::*;
pub use book_api::*;
pub use borrow_api::*;
pub use error::*;
pub use favorite_api::*;
pub use message_api::*;
pub use review_api::*;
pub use user_api::*;
