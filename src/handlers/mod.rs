pub mod admin;
pub mod auth;
pub mod customer;
pub mod driver;
pub mod maintenance;
pub mod manager;
