pub mod connection;
pub mod feed;
