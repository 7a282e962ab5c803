use async_trait::async_trait;
use brevo_lead_server::client::{AsyncBrevoClient, ConflictKind, RemoteOutcome};
use brevo_lead_server::domain::ContactId;
use brevo_lead_server::error::{BrevoApiError, BrevoApiResult};
use brevo_lead_server::models::{ContactPayload, EmailRequest};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// A contact as stored by the mock CRM.
#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredContact {
    pub id: i64,
    pub attributes: BTreeMap<String, String>,
    pub list_ids: Vec<i64>,
}

/// One contact call received by the mock.
#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    pub method: &'static str,
    pub email: String,
    pub attributes: BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
enum ScriptedAnswer {
    Outcome(RemoteOutcome),
    Timeout,
}

#[derive(Default)]
struct MockState {
    contacts: HashMap<String, StoredContact>,
    next_id: i64,
    calls: Vec<MockCall>,
    scripted: VecDeque<ScriptedAnswer>,
    emails: Vec<EmailRequest>,
    fail_emails: bool,
}

/// In-memory stand-in for the Brevo contacts API.
///
/// Enforces uniqueness of the email and of the `SMS` attribute the way Brevo
/// does. Scripted answers, when queued, are returned before the simulation
/// runs and still count as calls.
#[allow(dead_code)]
#[derive(Clone, Default)]
pub struct MockBrevoClient {
    state: Arc<Mutex<MockState>>,
}

#[allow(dead_code)]
impl MockBrevoClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an existing contact.
    pub fn add_contact(&self, email: &str, attributes: &[(&str, &str)]) -> i64 {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = state.next_id;
        state.contacts.insert(
            email.to_string(),
            StoredContact {
                id,
                attributes: attributes
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                list_ids: vec![],
            },
        );
        id
    }

    pub fn contact(&self, email: &str) -> Option<StoredContact> {
        self.state.lock().unwrap().contacts.get(email).cloned()
    }

    pub fn contact_count(&self) -> usize {
        self.state.lock().unwrap().contacts.len()
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().unwrap().calls.len()
    }

    /// Answer the next contact call with `outcome`.
    pub fn script(&self, outcome: RemoteOutcome) {
        self.state
            .lock()
            .unwrap()
            .scripted
            .push_back(ScriptedAnswer::Outcome(outcome));
    }

    /// Let the next contact call time out.
    pub fn script_timeout(&self) {
        self.state
            .lock()
            .unwrap()
            .scripted
            .push_back(ScriptedAnswer::Timeout);
    }

    pub fn sent_emails(&self) -> Vec<EmailRequest> {
        self.state.lock().unwrap().emails.clone()
    }

    pub fn fail_emails(&self) {
        self.state.lock().unwrap().fail_emails = true;
    }

    fn record(&self, method: &'static str, payload: &ContactPayload) -> Option<ScriptedAnswer> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(MockCall {
            method,
            email: payload.email().to_string(),
            attributes: payload.attributes().clone(),
        });
        state.scripted.pop_front()
    }

    fn answer(scripted: ScriptedAnswer) -> BrevoApiResult<RemoteOutcome> {
        match scripted {
            ScriptedAnswer::Outcome(outcome) => Ok(outcome),
            ScriptedAnswer::Timeout => Err(BrevoApiError::Timeout),
        }
    }

    fn phone_taken(state: &MockState, payload: &ContactPayload) -> bool {
        let Some(sms) = payload.attribute("SMS") else {
            return false;
        };
        state.contacts.iter().any(|(email, contact)| {
            email != payload.email() && contact.attributes.get("SMS").map(String::as_str) == Some(sms)
        })
    }
}

fn duplicate(kind: ConflictKind, message: &str) -> RemoteOutcome {
    RemoteOutcome::Conflict {
        kind,
        code: Some("duplicate_parameter".to_string()),
        message: message.to_string(),
    }
}

#[async_trait]
impl AsyncBrevoClient for MockBrevoClient {
    async fn create_contact(&self, payload: &ContactPayload) -> BrevoApiResult<RemoteOutcome> {
        if let Some(scripted) = self.record("POST", payload) {
            return Self::answer(scripted);
        }

        let mut state = self.state.lock().unwrap();
        if state.contacts.contains_key(payload.email()) {
            return Ok(duplicate(ConflictKind::Email, "Contact already exist"));
        }
        if Self::phone_taken(&state, payload) {
            return Ok(duplicate(
                ConflictKind::Phone,
                "Unable to create contact, SMS is already associated with another Contact",
            ));
        }

        state.next_id += 1;
        let id = state.next_id;
        state.contacts.insert(
            payload.email().to_string(),
            StoredContact {
                id,
                attributes: payload.attributes().clone(),
                list_ids: payload.list_ids().to_vec(),
            },
        );

        Ok(RemoteOutcome::Success {
            contact_id: ContactId::new(id).ok(),
        })
    }

    async fn update_contact(&self, payload: &ContactPayload) -> BrevoApiResult<RemoteOutcome> {
        if let Some(scripted) = self.record("PUT", payload) {
            return Self::answer(scripted);
        }

        let mut state = self.state.lock().unwrap();
        if !state.contacts.contains_key(payload.email()) {
            return Ok(RemoteOutcome::Failure {
                status: Some(404),
                message: "Contact does not exist".to_string(),
            });
        }
        if Self::phone_taken(&state, payload) {
            return Ok(duplicate(
                ConflictKind::Phone,
                "Unable to update contact, SMS is already associated with another Contact",
            ));
        }

        if let Some(contact) = state.contacts.get_mut(payload.email()) {
            for (name, value) in payload.attributes() {
                contact.attributes.insert(name.clone(), value.clone());
            }
            for id in payload.list_ids() {
                if !contact.list_ids.contains(id) {
                    contact.list_ids.push(*id);
                }
            }
        }

        Ok(RemoteOutcome::Success { contact_id: None })
    }

    async fn send_email(&self, email: &EmailRequest) -> BrevoApiResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_emails {
            return Err(BrevoApiError::ApiError {
                status: 401,
                message: "Key not found".to_string(),
            });
        }
        state.emails.push(email.clone());
        Ok(())
    }
}
