pub mod actor;
pub mod schema;
pub mod state;
pub mod utils;
