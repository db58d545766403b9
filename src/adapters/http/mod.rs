mod auth;
mod books;
mod borrowed;
mod client;
mod favorites;
mod messages;
mod reviews;
mod users;

pub use client::HttpLibraryApi;
