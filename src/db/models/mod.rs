//! Row and request/response types for the platform's tables.

pub mod campaign;
pub mod common;
pub mod influencer;
pub mod submission;
pub mod task;
pub mod user;

pub use campaign::*;
pub use common::*;
pub use influencer::*;
pub use submission::*;
pub use task::*;
pub use user::*;
