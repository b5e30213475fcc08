pub mod bulk_quotes;
pub mod health;
pub mod quotes;
pub mod responses;
pub mod router;
pub mod state;

pub use router::create_app;
pub use state::State;
