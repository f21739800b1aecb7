pub mod debrid;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod search;

pub use error::ErrorResponse;
pub use routes::create_router;
