pub mod borrow;
pub mod catalog;
pub mod dashboard;
mod deps;
mod errors;
pub mod favorites;
pub mod guard;
pub mod messaging;
pub mod reviews;
pub mod session;

#[allow(unused_imports)]
pub use deps::ServiceDependencies;
#[allow(unused_imports)]
pub use errors::{LibraryError, Result};
#[allow(unused_imports)]
pub use guard::{AdminRoute, Route, RouteDecision, UserRoute, guard, guard_path};
#[allow(unused_imports)]
pub use session::{SessionContext, SessionSnapshot};
