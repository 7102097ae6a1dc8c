pub mod dispatcher;
pub mod session_cache;
