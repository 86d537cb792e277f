pub mod cache;
pub mod config;
pub mod display;
pub mod routes;

pub use routes::create_router;
