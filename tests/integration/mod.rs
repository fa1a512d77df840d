//! Integration test modules.

mod repository_test;
mod trail_session_test;
