//! Wire models: the inbound form and the Brevo request bodies.

pub mod contact;
pub mod email;
pub mod form;

pub use contact::{
    ContactPayload, CreateContactRequest, PayloadOptions, PhoneStrategy, UpdateContactRequest,
    DEFAULT_LIST_ID,
};
pub use email::{EmailParty, EmailRequest};
pub use form::LeadForm;
