pub mod domain;
pub mod error;
pub mod mapper;
pub mod protocol;
