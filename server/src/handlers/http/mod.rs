pub mod auth;
pub mod profile;
pub mod routes;
pub mod utils;

pub use routes::build_api_router;
