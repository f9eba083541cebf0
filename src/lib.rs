pub mod audit;
pub mod cart;
pub mod config;
pub mod db;
pub mod docstore;
pub mod dto;
pub mod entity;
pub mod error;
pub mod exchange;
pub mod invoice;
pub mod middleware;
pub mod models;
pub mod money;
pub mod report;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;
