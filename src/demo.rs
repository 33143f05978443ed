//! Demo controllers served by the `routebind` binary.
//!
//! Every endpoint method gets its own controller instance, so state shared
//! between methods lives outside the controller ([`NoteStore::shared`]).

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::discovery::{Catalog, Namespace};
use crate::endpoint::{Controller, Endpoint, EndpointDescriptor, Json};
use crate::error::BoxError;

/// Namespace the demo controllers are declared in.
pub const NAMESPACE: &str = module_path!();

pub fn catalog() -> Catalog {
    Catalog::new().namespace(
        Namespace::new(NAMESPACE)
            .controller::<Greetings>()
            .controller::<Notes>(),
    )
}

pub struct Greetings;

#[derive(Serialize)]
struct Greeting {
    message: String,
}

impl Controller for Greetings {
    fn construct() -> Result<Self, BoxError> {
        Ok(Greetings)
    }

    fn endpoints() -> Vec<Endpoint<Self>> {
        vec![
            Endpoint::value(EndpointDescriptor::get("/hello"), |_| "Hello, world"),
            Endpoint::value_with_context(EndpointDescriptor::get("/hello/{name}"), |_, ctx| {
                Json(Greeting {
                    message: format!("Hello, {}", ctx.path_param("name").unwrap_or("stranger")),
                })
            }),
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Note {
    #[serde(default)]
    pub id: u64,
    pub text: String,
}

#[derive(Debug, Default)]
pub struct NoteStore {
    next_id: AtomicU64,
    notes: Mutex<BTreeMap<u64, Note>>,
}

impl NoteStore {
    pub fn shared() -> Arc<NoteStore> {
        static STORE: OnceLock<Arc<NoteStore>> = OnceLock::new();
        STORE.get_or_init(|| Arc::new(NoteStore::default())).clone()
    }

    fn insert(&self, text: String) -> Result<Note, BoxError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let note = Note { id, text };
        self.notes
            .lock()
            .map_err(|_| "note store poisoned")?
            .insert(id, note.clone());
        Ok(note)
    }

    fn list(&self) -> Result<Vec<Note>, BoxError> {
        Ok(self
            .notes
            .lock()
            .map_err(|_| "note store poisoned")?
            .values()
            .cloned()
            .collect())
    }

    fn get(&self, id: u64) -> Result<Option<Note>, BoxError> {
        Ok(self.notes.lock().map_err(|_| "note store poisoned")?.get(&id).cloned())
    }

    fn remove(&self, id: u64) -> Result<bool, BoxError> {
        Ok(self
            .notes
            .lock()
            .map_err(|_| "note store poisoned")?
            .remove(&id)
            .is_some())
    }
}

pub struct Notes {
    store: Arc<NoteStore>,
}

fn note_id(raw: Option<&str>) -> Result<u64, BoxError> {
    Ok(raw.ok_or("missing note id")?.parse()?)
}

impl Controller for Notes {
    fn descriptor() -> Option<EndpointDescriptor> {
        Some(EndpointDescriptor::new("/notes"))
    }

    fn construct() -> Result<Self, BoxError> {
        Ok(Notes {
            store: NoteStore::shared(),
        })
    }

    fn endpoints() -> Vec<Endpoint<Self>> {
        vec![
            Endpoint::<Self>::value(EndpointDescriptor::get("/"), |this| this.store.list().map(Json)),
            Endpoint::<Self>::value_with_context(EndpointDescriptor::get("/{id}"), |this, ctx| {
                let id = note_id(ctx.path_param("id"))?;
                this.store.get(id).map(|note| note.map(Json))
            }),
            Endpoint::<Self>::void(EndpointDescriptor::post("/"), |this, ctx| {
                let draft: Note = ctx.body_json()?;
                let note = this.store.insert(draft.text)?;
                ctx.set_status(StatusCode::CREATED).json(&note)?;
                Ok(())
            }),
            Endpoint::<Self>::void(EndpointDescriptor::delete("/{id}"), |this, ctx| {
                let id = note_id(ctx.path_param("id"))?;
                let status = if this.store.remove(id)? {
                    StatusCode::NO_CONTENT
                } else {
                    StatusCode::NOT_FOUND
                };
                ctx.set_status(status);
                Ok(())
            }),
        ]
    }
}
