//! Mock implementations for testing.

pub mod mock_brevo_client;

#[allow(unused_imports)]
pub use mock_brevo_client::{MockBrevoClient, MockCall, StoredContact};
