pub mod clock;
pub mod cors;
pub mod error;
pub mod model;
pub mod routes;
pub mod server;
pub mod state;
pub mod telemetry;
pub mod traffic;

pub use clock::*;
pub use error::*;
pub use model::*;
pub use routes::*;
pub use server::*;
pub use state::*;
pub use telemetry::*;
pub use traffic::*;
