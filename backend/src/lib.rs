pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod ids;
pub mod rest;
pub mod storage;
pub mod text;
