// SPDX-FileCopyrightText: 2026 Plinth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock auth plugin with a fixed user table.

use std::any::Any;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use plinth_core::types::{AuthSession, SignInRequest};
use plinth_core::{AuthPlugin, CategoryType, Operation, PlinthError, Plugin};
use serde::Deserialize;

use crate::recorder::ConfigureRecorder;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MockAuthSettings {
    /// Username to password.
    #[serde(default)]
    pub users: BTreeMap<String, String>,
}

type SessionSlot = Arc<Mutex<Option<AuthSession>>>;

/// A mock auth backend for testing.
#[derive(Debug)]
pub struct MockAuthPlugin {
    recorder: ConfigureRecorder<MockAuthSettings>,
    session: SessionSlot,
}

impl MockAuthPlugin {
    pub const KEY: &'static str = "mock-auth";

    pub fn new() -> Self {
        Self {
            recorder: ConfigureRecorder::new(CategoryType::Auth, Self::KEY),
            session: Arc::new(Mutex::new(None)),
        }
    }

    pub fn configure_calls(&self) -> usize {
        self.recorder.calls()
    }
}

impl Default for MockAuthPlugin {
    fn default() -> Self {
        Self::new()
    }
}

fn store(slot: &SessionSlot, session: Option<AuthSession>) {
    *slot.lock().unwrap_or_else(PoisonError::into_inner) = session;
}

impl Plugin for MockAuthPlugin {
    fn plugin_key(&self) -> &str {
        self.recorder.key()
    }

    fn category(&self) -> CategoryType {
        CategoryType::Auth
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn configure(&self, config: &serde_json::Value) -> Result<(), PlinthError> {
        self.recorder.configure(config)
    }

    fn escape_hatch(&self) -> Result<Arc<dyn Any + Send + Sync>, PlinthError> {
        Ok(self.recorder.require()? as Arc<dyn Any + Send + Sync>)
    }
}

impl AuthPlugin for MockAuthPlugin {
    fn sign_in(&self, request: SignInRequest) -> Operation<AuthSession> {
        let settings = self.recorder.require();
        let slot = Arc::clone(&self.session);
        let echo = request.clone();

        Operation::new(CategoryType::Auth, &echo, move |ctx| async move {
            let settings = settings?;
            match settings.users.get(&request.username) {
                Some(password) if *password == request.password => {
                    let session = AuthSession {
                        username: request.username,
                        signed_in: true,
                    };
                    store(&slot, Some(session.clone()));
                    Ok(session)
                }
                _ => Err(ctx.fail("incorrect username or password")),
            }
        })
    }

    fn sign_out(&self) -> Operation<()> {
        let settings = self.recorder.require();
        let slot = Arc::clone(&self.session);

        Operation::new(CategoryType::Auth, &(), move |_| async move {
            settings?;
            store(&slot, None);
            Ok(())
        })
    }

    fn current_session(&self) -> Option<AuthSession> {
        self.session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
