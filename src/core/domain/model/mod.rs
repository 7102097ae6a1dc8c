pub mod access;
pub mod cluster_endpoint;
pub mod history;
pub mod network;
pub mod operation;
pub mod resource;
pub mod session;
pub mod snapshot;
pub mod storage;
pub mod summary;
pub mod task;
