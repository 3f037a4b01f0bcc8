//! Application services layer.

pub mod admin;
pub mod auth;
pub mod catalog;
pub mod error;
pub mod repos;
pub mod sitemap;
