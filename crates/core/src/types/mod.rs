//! Value types shared by the checkout workflow.

pub mod address;
pub mod email;
pub mod id;
pub mod money;
pub mod status;

pub use address::Address;
pub use email::{Email, EmailError};
pub use id::*;
pub use money::{CurrencyCode, Money};
pub use status::*;
