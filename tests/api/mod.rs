mod auth;
mod batch;
mod client;
