pub mod api;
pub mod app;
pub mod auth;
pub mod backend;
pub mod billing;
pub mod cli;
pub mod config;
pub mod db;
pub mod entitlement;
pub mod global;
pub mod subscription;
pub mod upload;
