//! Domain value objects and types.
//!
//! Type-safe wrappers for lead data. Value objects validate at construction
//! so an invalid lead can never reach the CRM client.

pub mod contact_id;
pub mod email;
pub mod errors;
pub mod lead;
pub mod phone;

pub use contact_id::ContactId;
pub use email::EmailAddress;
pub use errors::ValidationError;
pub use lead::LeadRecord;
pub use phone::{PhoneNumber, PhoneParts};
