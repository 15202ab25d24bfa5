pub mod api;
pub mod server;

pub use api::{StubState, StubStats};
pub use server::start_server;
