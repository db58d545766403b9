pub mod book;
pub mod borrow;
pub mod commands;
pub mod errors;
pub mod favorite;
pub mod message;
pub mod review;
pub mod user;
pub mod value_objects;

pub use book::*;
pub use borrow::*;
pub use errors::*;
pub use favorite::*;
pub use message::*;
pub use review::*;
pub use user::*;
pub use value_objects::{BookId, BorrowId, IdParseError, MessageId, ReviewId, UserId};
