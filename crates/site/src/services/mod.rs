//! External service clients.

pub mod email;
pub mod stripe;
