pub mod admin;
pub mod apps;
pub mod auth;
pub mod groups;
pub mod pages;
pub mod public;
pub mod variables;
