pub mod config;
pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod models;
pub mod publisher;
pub mod resolver;
pub mod routes;
pub mod service;
pub mod template;

#[cfg(test)]
mod tests;
