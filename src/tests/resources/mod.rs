mod cluster_tests;
mod history_tests;
mod node_tests;
mod session_tests;
