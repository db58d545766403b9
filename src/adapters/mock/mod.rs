pub mod library;

#[allow(unused_imports)]
pub use library::InMemoryLibrary;
