//! In-memory fakes for the transport and backend ports.

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;

use crate::{
    domain::{ChatId, EventId, UserId, UserRecord},
    errors::Error,
    handlers::{HandlerDeps, HandlerSettings},
    messaging::{
        port::TransportClient,
        types::{Event, ReplyKeyboard},
    },
    ports::{BackendClient, ProvisionOutcome},
    Result,
};

/// Cross-fake call log, for asserting ordering between ports.
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

#[derive(Clone, Debug)]
pub struct SentMessage {
    pub chat_id: ChatId,
    pub text: String,
    pub keyboard: Option<ReplyKeyboard>,
}

type FetchHook = Box<dyn FnMut(usize) + Send>;

#[derive(Default)]
pub struct FakeTransport {
    script: Mutex<VecDeque<Result<Vec<Event>>>>,
    offsets: Mutex<Vec<EventId>>,
    sent: Mutex<Vec<SentMessage>>,
    fail_sends: AtomicBool,
    journal: Mutex<Option<Journal>>,
    on_fetch: Mutex<Option<FetchHook>>,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue the result of the next fetch. Once the script runs dry fetches return `Ok([])`.
    pub fn push_fetch(&self, result: Result<Vec<Event>>) {
        self.script.lock().unwrap().push_back(result);
    }

    pub fn push_transport_error(&self) {
        self.push_fetch(Err(Error::Transport("connection reset".to_string())));
    }

    /// Called with the 1-based fetch count, before the fetch returns.
    pub fn on_fetch(&self, hook: impl FnMut(usize) + Send + 'static) {
        *self.on_fetch.lock().unwrap() = Some(Box::new(hook));
    }

    pub fn offsets(&self) -> Vec<EventId> {
        self.offsets.lock().unwrap().clone()
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    pub fn attach_journal(&self, journal: Journal) {
        *self.journal.lock().unwrap() = Some(journal);
    }
}

#[async_trait]
impl TransportClient for FakeTransport {
    async fn fetch_events(&self, offset: EventId) -> Result<Vec<Event>> {
        let count = {
            let mut offsets = self.offsets.lock().unwrap();
            offsets.push(offset);
            offsets.len()
        };
        if let Some(hook) = self.on_fetch.lock().unwrap().as_mut() {
            hook(count);
        }
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn deliver_message(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Option<&ReplyKeyboard>,
    ) -> Result<()> {
        if let Some(j) = self.journal.lock().unwrap().as_ref() {
            j.push(format!("deliver:{}", chat_id.0));
        }
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(Error::Transport("send failed".to_string()));
        }
        self.sent.lock().unwrap().push(SentMessage {
            chat_id,
            text: text.to_string(),
            keyboard: keyboard.cloned(),
        });
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub enum ProvisionBehavior {
    #[default]
    Create,
    AlreadyExists,
    Fail,
}

#[derive(Default)]
pub struct FakeBackend {
    records: Mutex<Vec<(UserId, UserRecord)>>,
    provisions: Mutex<Vec<(String, String, String)>>,
    fail_upserts: AtomicBool,
    provision: Mutex<ProvisionBehavior>,
    journal: Mutex<Option<Journal>>,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn records(&self) -> Vec<(UserId, UserRecord)> {
        self.records.lock().unwrap().clone()
    }

    pub fn provisions(&self) -> Vec<(String, String, String)> {
        self.provisions.lock().unwrap().clone()
    }

    pub fn fail_upserts(&self, fail: bool) {
        self.fail_upserts.store(fail, Ordering::SeqCst);
    }

    pub fn set_provision(&self, behavior: ProvisionBehavior) {
        *self.provision.lock().unwrap() = behavior;
    }

    pub fn attach_journal(&self, journal: Journal) {
        *self.journal.lock().unwrap() = Some(journal);
    }
}

#[async_trait]
impl BackendClient for FakeBackend {
    async fn upsert_record(&self, key: UserId, record: &UserRecord) -> Result<()> {
        if let Some(j) = self.journal.lock().unwrap().as_ref() {
            j.push(format!("upsert:{}", key.0));
        }
        if self.fail_upserts.load(Ordering::SeqCst) {
            return Err(Error::Backend("firestore unavailable".to_string()));
        }
        self.records.lock().unwrap().push((key, record.clone()));
        Ok(())
    }

    async fn provision_account(
        &self,
        login_identifier: &str,
        secret: &str,
        display_name: &str,
    ) -> Result<ProvisionOutcome> {
        if let Some(j) = self.journal.lock().unwrap().as_ref() {
            j.push("provision");
        }
        self.provisions.lock().unwrap().push((
            login_identifier.to_string(),
            secret.to_string(),
            display_name.to_string(),
        ));
        match *self.provision.lock().unwrap() {
            ProvisionBehavior::Create => Ok(ProvisionOutcome::Created {
                uid: format!("uid-{login_identifier}"),
            }),
            ProvisionBehavior::AlreadyExists => Ok(ProvisionOutcome::AlreadyExists),
            ProvisionBehavior::Fail => Err(Error::Backend("auth unavailable".to_string())),
        }
    }
}

pub fn deps(transport: &Arc<FakeTransport>, backend: &Arc<FakeBackend>) -> HandlerDeps {
    HandlerDeps {
        transport: transport.clone(),
        backend: backend.clone(),
        settings: HandlerSettings::default(),
    }
}

pub fn origin(chat: i64, user: i64) -> crate::messaging::types::Origin {
    crate::messaging::types::Origin {
        chat_id: ChatId(chat),
        user_id: UserId(user),
        first_name: "Ali".to_string(),
        username: None,
    }
}

pub fn text_event(id: i64, text: &str) -> Event {
    Event::new(
        EventId(id),
        origin(100, 200),
        crate::messaging::types::Payload::Text(text.to_string()),
    )
}

pub fn contact_event(id: i64, phone: &str, user: i64) -> Event {
    Event::new(
        EventId(id),
        origin(100, user),
        crate::messaging::types::Payload::Contact(crate::messaging::types::ContactShare {
            phone_number: phone.to_string(),
            display_name: "Ali".to_string(),
            sharing_user_id: UserId(user),
        }),
    )
}
