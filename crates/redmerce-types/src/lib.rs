pub mod message;
pub mod product;
pub mod request;
pub mod reply;
pub mod event;
pub mod config;
pub mod error;


pub use error::RedmerceError;
pub type Result<T> = std::result::Result<T, RedmerceError>;
