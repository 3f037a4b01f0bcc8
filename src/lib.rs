//! Kalem is a self-hosted blog platform: a server-rendered public blog with
//! SEO metadata and sitemap generation, a JSON API over the same catalog, and
//! a token-guarded admin CMS, all backed by Postgres.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
