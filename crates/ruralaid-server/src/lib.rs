//! RuralAid server library — shared state and HTTP routes.

pub mod routes;
pub mod state;

pub use routes::build_router;
pub use state::AppState;
