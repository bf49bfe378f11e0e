pub mod app;
pub mod auth;
pub mod db;
pub mod handlers;
pub mod helpers;
pub mod models;
pub mod oauth;
pub mod routes;
pub mod view_model;
