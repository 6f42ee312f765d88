pub mod callbacks;
pub mod layout;
pub mod page;
pub mod registry;
pub mod server;

pub use callbacks::dashboard_registry;
pub use registry::CallbackRegistry;
pub use server::{build_router, serve, AppState};
