//! Test utilities for the registration flow
//!
//! [`FakeAuthApi`] is an in-memory [`AuthApi`] that records every call and
//! can hold individual responses back, which lets tests deliver answers out
//! of order.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Notify;

use crate::auth::{AuthApi, AuthError, Credentials, RegistrationRequest, Result};

/// A call received by [`FakeAuthApi`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    /// Nickname availability query
    CheckNickname(String),
    /// Email availability query
    CheckEmail(String),
    /// Registration
    Register(RegistrationRequest),
}

/// In-memory authentication backend
#[derive(Debug, Default)]
pub struct FakeAuthApi {
    taken_nicknames: Mutex<HashSet<String>>,
    taken_emails: Mutex<HashSet<String>>,
    failing_checks: Mutex<HashMap<String, AuthError>>,
    registration_error: Mutex<Option<AuthError>>,
    held: Mutex<HashMap<String, Arc<Notify>>>,
    held_registration: Mutex<Option<Arc<Notify>>>,
    calls: Mutex<Vec<ApiCall>>,
}

impl FakeAuthApi {
    /// Create a backend where everything is available
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a nickname as already in use
    pub fn take_nickname(&self, nickname: &str) {
        self.taken_nicknames.lock().insert(nickname.to_string());
    }

    /// Mark an email as already in use
    pub fn take_email(&self, email: &str) {
        self.taken_emails.lock().insert(email.to_string());
    }

    /// Make the availability query for `value` fail
    pub fn fail_check(&self, value: &str, error: AuthError) {
        self.failing_checks.lock().insert(value.to_string(), error);
    }

    /// Make registration fail
    pub fn fail_registration(&self, error: AuthError) {
        *self.registration_error.lock() = Some(error);
    }

    /// Hold back the availability answer for `value` until the returned
    /// handle is notified
    pub fn hold(&self, value: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.held.lock().insert(value.to_string(), Arc::clone(&gate));
        gate
    }

    /// Hold back the answer to the next registration until the returned
    /// handle is notified
    pub fn hold_registration(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.held_registration.lock() = Some(Arc::clone(&gate));
        gate
    }

    /// All calls received so far
    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().clone()
    }

    /// Number of email availability queries for `email`
    pub fn email_checks_for(&self, email: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| matches!(call, ApiCall::CheckEmail(value) if value == email))
            .count()
    }

    /// Number of registration calls
    pub fn registrations(&self) -> usize {
        self.calls.lock().iter().filter(|call| matches!(call, ApiCall::Register(_))).count()
    }

    async fn answer(&self, value: &str, taken: &Mutex<HashSet<String>>) -> Result<bool> {
        let gate = self.held.lock().get(value).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if let Some(error) = self.failing_checks.lock().get(value) {
            return Err(error.clone());
        }
        Ok(!taken.lock().contains(value))
    }
}

#[async_trait]
impl AuthApi for FakeAuthApi {
    async fn check_nickname_available(&self, nickname: &str) -> Result<bool> {
        self.calls.lock().push(ApiCall::CheckNickname(nickname.to_string()));
        self.answer(nickname, &self.taken_nicknames).await
    }

    async fn check_email_available(&self, email: &str) -> Result<bool> {
        self.calls.lock().push(ApiCall::CheckEmail(email.to_string()));
        self.answer(email, &self.taken_emails).await
    }

    async fn register(&self, request: RegistrationRequest) -> Result<Credentials> {
        self.calls.lock().push(ApiCall::Register(request.clone()));

        let gate = self.held_registration.lock().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if let Some(error) = self.registration_error.lock().clone() {
            return Err(error);
        }
        Ok(Credentials {
            name: request.name,
            email: request.email,
            token: format!("token-{}", request.nickname),
        })
    }
}
