//! Core types for Fiftymillimeter.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod price;
pub mod status;

pub use email::{Email, EmailError};
pub use id::{OrderId, PaymentIntentId, ProductId};
pub use price::MinorUnits;
pub use status::OrderStatus;
