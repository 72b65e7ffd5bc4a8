mod error;
mod server;
mod state;

pub use error::ErrorBody;
pub use server::{make_app, run_server};
pub use state::{ServerState, SharedService};
