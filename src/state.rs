use std::sync::Arc;

use parking_lot::RwLock;

use crate::config::Credentials;
use crate::lookup::{ImageLookupClient, TextInsightClient};

/// Session-scoped credentials. Only the explicit save action writes them;
/// lookups read a snapshot.
#[derive(Clone, Default)]
pub struct SessionState {
    credentials: Arc<RwLock<Credentials>>,
}

impl SessionState {
    pub fn new(credentials: Credentials) -> Self {
        SessionState {
            credentials: Arc::new(RwLock::new(credentials)),
        }
    }

    pub fn credentials(&self) -> Credentials {
        self.credentials.read().clone()
    }

    pub fn save(&self, credentials: Credentials) {
        *self.credentials.write() = credentials;
    }
}

#[derive(Clone)]
pub struct AppState {
    pub session: SessionState,
    pub text: TextInsightClient,
    pub images: ImageLookupClient,
}

impl AppState {
    pub fn new(session: SessionState, text: TextInsightClient, images: ImageLookupClient) -> Self {
        AppState {
            session,
            text,
            images,
        }
    }
}
