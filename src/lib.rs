//! Nexlyn catalog core: product catalog state with durable sync, filtering, banner
//! rotation, the admin editor and the assistant chat bridge.

pub mod admin;
pub mod aggregate;
pub mod banner;
pub mod chat;
pub mod config;
pub mod db;
pub mod error;
pub mod filter;
pub mod gemini;
pub mod models;
pub mod paths;
pub mod prompts;
pub mod seed;
pub mod store;
pub mod storefront;
pub mod upload;
pub mod voice;
pub mod whatsapp;
