//! Server-rendered view structs and their askama templates.

pub mod views;
