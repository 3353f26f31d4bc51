//! HTTP API handlers
//!
//! One module per route group, mirroring the mounted prefixes.

pub mod auth;
pub mod planner;
pub mod root;
pub mod study_buddy;
pub mod voice_notes;

pub use planner::planner_routes;
pub use root::root_routes;
pub use study_buddy::study_buddy_routes;
pub use voice_notes::voice_notes_routes;
