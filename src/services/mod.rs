//! Domain services behind the HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own the session/role resolution logic and the probe so
//! route handlers can stay focused on rendering and form plumbing.

pub mod probe;
pub mod resolver;
pub mod session;
