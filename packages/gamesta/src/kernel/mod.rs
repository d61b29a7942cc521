//! Kernel module - backend seams, live and mock implementations, and the
//! dependency container.

pub mod change_feed;
pub mod deps;
pub mod stream_hub;
pub mod supabase_backend;
pub mod test_dependencies;
pub mod traits;

pub use change_feed::ChangeFeed;
pub use deps::GamestaDeps;
pub use stream_hub::StreamHub;
pub use supabase_backend::SupabaseBackend;
pub use test_dependencies::MockBackend;
pub use traits::*;
