pub mod api;
pub mod config;
pub mod humanize;
pub mod observability;
pub mod registry;
pub mod search;
pub mod worker;
