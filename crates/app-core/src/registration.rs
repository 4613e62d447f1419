//! Registration form model
//!
//! [`RegistrationForm`] is the state behind the sign-up screen. It keeps the
//! raw field values, derives per-field and whole-form validity, runs the
//! nickname and email availability queries, and turns a valid form into a
//! [`RegistrationRequest`].
//!
//! The form has a single owner and every mutation goes through `&mut self`.
//! Availability queries run in the background; their answers are applied
//! only when the owner resumes them with [`RegistrationForm::process_next_check`]
//! or [`RegistrationForm::settle_checks`], and only if they answer the latest
//! query for their field. Dropping the form aborts every pending query.
//!
//! # Example
//!
//! ```rust
//! use app_core::auth::{AuthApi, Credentials, RegistrationRequest, Result};
//! use app_core::registration::{Field, RegistrationForm};
//! use app_core::RegistrationConfig;
//! use async_trait::async_trait;
//! use std::sync::Arc;
//!
//! struct OpenApi;
//!
//! #[async_trait]
//! impl AuthApi for OpenApi {
//!     async fn check_nickname_available(&self, _nickname: &str) -> Result<bool> {
//!         Ok(true)
//!     }
//!
//!     async fn check_email_available(&self, _email: &str) -> Result<bool> {
//!         Ok(true)
//!     }
//!
//!     async fn register(&self, request: RegistrationRequest) -> Result<Credentials> {
//!         Ok(Credentials { name: request.name, email: request.email, token: "t".into() })
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let api = Arc::new(OpenApi);
//!     let (mut form, _events) = RegistrationForm::new(api, RegistrationConfig::default());
//!
//!     form.set_field(Field::Name, "anna");
//!     form.set_field(Field::Surname, "smith");
//!     form.set_field(Field::Nickname, "annas");
//!     form.set_field(Field::Email, "anna@example.com");
//!     form.set_field(Field::Password, "tomato123");
//!     form.set_field(Field::PasswordRepeat, "tomato123");
//!     form.settle_checks().await;
//!
//!     let request = form.submit().await.unwrap();
//!     assert_eq!(request.name, "Anna");
//! }
//! ```

use app_state::{
    event_channel, AsyncCheck, AsyncCheckState, DerivedState, EventSender, EventStream,
    MutableState, RequestId,
};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinSet;

use crate::auth::{AuthApi, AuthError, Credentials, RegistrationRequest};
use crate::config::RegistrationConfig;
use crate::validation::{
    capitalize, is_password_valid, is_valid_email, is_valid_nickname, password_error, FieldError,
};

/// Message stored when the backend reports a nickname as taken
pub const NICKNAME_TAKEN: &str = "Nickname is already taken";

/// Message stored when the backend reports an email as taken
pub const EMAIL_TAKEN: &str = "Email is already in use";

/// Registration form errors
#[derive(Debug, Error)]
pub enum FormError {
    /// The form is not valid; the listed fields carry inline errors
    #[error("Form is invalid: {} field(s) need attention", .0.len())]
    Validation(Vec<(Field, FieldError)>),

    /// A registration request is already running
    #[error("Registration already in progress")]
    InProgress,

    /// The backend refused or failed the registration
    #[error("Registration failed: {0}")]
    Registration(#[from] AuthError),
}

/// Result type for form operations
pub type Result<T> = std::result::Result<T, FormError>;

/// Input fields of the registration form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// First name
    Name,
    /// Last name
    Surname,
    /// Public nickname
    Nickname,
    /// Email address
    Email,
    /// Password
    Password,
    /// Password confirmation
    PasswordRepeat,
}

impl Field {
    /// Every field, in screen order
    pub const ALL: [Field; 6] = [
        Field::Name,
        Field::Surname,
        Field::Nickname,
        Field::Email,
        Field::Password,
        Field::PasswordRepeat,
    ];
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Name => "name",
            Field::Surname => "surname",
            Field::Nickname => "nickname",
            Field::Email => "email",
            Field::Password => "password",
            Field::PasswordRepeat => "password repeat",
        };
        f.write_str(name)
    }
}

/// Fields backed by an availability query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckKind {
    /// Nickname uniqueness
    Nickname,
    /// Email uniqueness
    Email,
}

impl CheckKind {
    fn field(self) -> Field {
        match self {
            CheckKind::Nickname => Field::Nickname,
            CheckKind::Email => Field::Email,
        }
    }

    fn taken_message(self) -> &'static str {
        match self {
            CheckKind::Nickname => NICKNAME_TAKEN,
            CheckKind::Email => EMAIL_TAKEN,
        }
    }
}

/// Result of resuming one finished availability query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    /// The answer was for the latest query and is now the field's state
    Applied {
        /// Which check
        kind: CheckKind,
        /// Request the answer belonged to
        id: RequestId,
    },
    /// The query was superseded; its answer was dropped
    Discarded {
        /// Which check
        kind: CheckKind,
        /// Request the answer belonged to
        id: RequestId,
    },
}

/// Raw values of every field
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormValues {
    /// First name
    pub name: String,
    /// Last name
    pub surname: String,
    /// Public nickname
    pub nickname: String,
    /// Email address
    pub email: String,
    /// Password
    pub password: String,
    /// Password confirmation
    pub password_repeat: String,
}

impl FormValues {
    /// Value of a field
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Surname => &self.surname,
            Field::Nickname => &self.nickname,
            Field::Email => &self.email,
            Field::Password => &self.password,
            Field::PasswordRepeat => &self.password_repeat,
        }
    }

    fn get_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::Name => &mut self.name,
            Field::Surname => &mut self.surname,
            Field::Nickname => &mut self.nickname,
            Field::Email => &mut self.email,
            Field::Password => &mut self.password,
            Field::PasswordRepeat => &mut self.password_repeat,
        }
    }
}

/// Screens the registration flow can navigate to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Login screen
    Login,
    /// Registration screen
    Registration,
}

/// One-shot events emitted by the registration form
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RegistrationEvent {
    /// Show a transient message to the user
    ShowMessage(String),
    /// Registration succeeded
    CredentialsObtained(Credentials),
    /// Move to another screen
    NavigateTo(Screen),
}

/// Status of the registration request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegistrationStatus {
    /// No request running
    #[default]
    Idle,
    /// Request sent, waiting for the backend
    Loading,
}

/// Everything whole-form validity depends on
#[derive(Debug, Clone, PartialEq, Eq)]
struct ValidityKey {
    values: FormValues,
    nickname_rejected: bool,
    email_rejected: bool,
}

/// Puts the status back to idle when a submit ends, including when its
/// future is dropped mid-request
struct SubmitGuard<'a> {
    status: &'a mut RegistrationStatus,
}

impl<'a> SubmitGuard<'a> {
    fn enter(status: &'a mut RegistrationStatus) -> Self {
        *status = RegistrationStatus::Loading;
        Self { status }
    }
}

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        *self.status = RegistrationStatus::Idle;
    }
}

struct CheckCompletion {
    kind: CheckKind,
    id: RequestId,
    /// `None` when the query was superseded before it was sent
    result: Option<crate::auth::Result<bool>>,
}

/// State of one registration screen session
pub struct RegistrationForm {
    api: Arc<dyn AuthApi>,
    config: RegistrationConfig,
    values: MutableState<FormValues>,
    password_visible: MutableState<bool>,
    nickname_check: AsyncCheck,
    email_check: AsyncCheck,
    password_valid: DerivedState<String, bool>,
    form_valid: DerivedState<ValidityKey, bool>,
    status: RegistrationStatus,
    in_flight: JoinSet<CheckCompletion>,
    events: EventSender<RegistrationEvent>,
}

impl RegistrationForm {
    /// Start a registration session
    ///
    /// Returns the form and the stream of its one-shot events. Must be
    /// called within a Tokio runtime, since availability queries are spawned
    /// onto it.
    pub fn new(
        api: Arc<dyn AuthApi>,
        config: RegistrationConfig,
    ) -> (Self, EventStream<RegistrationEvent>) {
        let (events, stream) = event_channel();
        let min_length = config.min_password_length;

        let form = Self {
            api,
            config,
            values: MutableState::default(),
            password_visible: MutableState::new(false),
            nickname_check: AsyncCheck::new(),
            email_check: AsyncCheck::new(),
            password_valid: DerivedState::keyed(move |password: &String| {
                is_password_valid(password, min_length)
            }),
            form_valid: DerivedState::keyed(move |key: &ValidityKey| {
                let values = &key.values;
                !values.name.is_empty()
                    && !values.surname.is_empty()
                    && is_valid_nickname(&values.nickname)
                    && !key.nickname_rejected
                    && is_valid_email(&values.email)
                    && !key.email_rejected
                    && is_password_valid(&values.password, min_length)
                    && values.password_repeat == values.password
            }),
            status: RegistrationStatus::Idle,
            in_flight: JoinSet::new(),
            events,
        };

        (form, stream)
    }

    /// Active configuration
    pub fn config(&self) -> &RegistrationConfig {
        &self.config
    }

    /// Current value of a field
    pub fn value(&self, field: Field) -> String {
        self.values.with(|values| values.get(field).to_string())
    }

    /// Snapshot of every field
    pub fn values(&self) -> FormValues {
        self.values.get()
    }

    /// Subscribe to field edits
    pub fn subscribe_values(&self) -> watch::Receiver<FormValues> {
        self.values.subscribe()
    }

    /// Store a user edit
    ///
    /// Name and surname are trimmed. A nickname or email that passes its
    /// local rule starts an availability query; one that fails it resets the
    /// query state and drops any answer still in flight. Re-entering the
    /// current value changes nothing.
    pub fn set_field(&mut self, field: Field, value: &str) {
        let value = match field {
            Field::Name | Field::Surname if self.config.trim_personal_names => value.trim(),
            _ => value,
        };

        if self.values.with(|values| values.get(field) == value) {
            return;
        }

        self.values.update(|values| {
            let mut next = values.clone();
            *next.get_mut(field) = value.to_string();
            next
        });
        tracing::debug!(%field, "Registration field updated");

        match field {
            Field::Nickname => {
                if is_valid_nickname(value) {
                    self.check_availability(CheckKind::Nickname);
                } else {
                    self.nickname_check.reset();
                }
            }
            Field::Email => {
                if is_valid_email(value) {
                    self.check_availability(CheckKind::Email);
                } else {
                    self.email_check.reset();
                }
            }
            _ => {}
        }
    }

    /// Empty a field
    pub fn clear_field(&mut self, field: Field) {
        self.set_field(field, "");
    }

    /// Query availability of the stored value, superseding any previous
    /// query for `kind`
    ///
    /// The state turns to loading immediately; the answer is applied when
    /// resumed through [`Self::process_next_check`].
    fn check_availability(&mut self, kind: CheckKind) -> RequestId {
        let value = self.value(kind.field());
        let check = self.check_mut(kind);
        let id = check.begin();
        let latest = check.latest_handle();
        let api = Arc::clone(&self.api);
        let debounce = self.config.availability_debounce();

        tracing::debug!(?kind, id, "Dispatching availability check");

        self.in_flight.spawn(async move {
            if !debounce.is_zero() {
                tokio::time::sleep(debounce).await;
                if !latest.is_current(id) {
                    return CheckCompletion { kind, id, result: None };
                }
            }

            let result = match kind {
                CheckKind::Nickname => api.check_nickname_available(&value).await,
                CheckKind::Email => api.check_email_available(&value).await,
            };
            CheckCompletion { kind, id, result: Some(result) }
        });

        id
    }

    /// Wait for the next finished availability query and apply it
    ///
    /// Returns `None` when no query is pending.
    pub async fn process_next_check(&mut self) -> Option<CheckOutcome> {
        loop {
            match self.in_flight.join_next().await? {
                Ok(completion) => return Some(self.apply_completion(completion)),
                Err(e) => {
                    tracing::warn!("Availability check task failed: {}", e);
                }
            }
        }
    }

    /// Wait for every pending availability query
    pub async fn settle_checks(&mut self) -> Vec<CheckOutcome> {
        let mut outcomes = Vec::new();
        while let Some(outcome) = self.process_next_check().await {
            outcomes.push(outcome);
        }
        outcomes
    }

    /// Number of availability queries not yet resumed
    pub fn pending_checks(&self) -> usize {
        self.in_flight.len()
    }

    fn apply_completion(&mut self, completion: CheckCompletion) -> CheckOutcome {
        let CheckCompletion { kind, id, result } = completion;

        let Some(result) = result else {
            tracing::trace!(?kind, id, "Availability check superseded before dispatch");
            return CheckOutcome::Discarded { kind, id };
        };

        let (available, error) = match result {
            Ok(true) => (true, None),
            Ok(false) => (false, Some(kind.taken_message().to_string())),
            Err(e) => {
                tracing::warn!(?kind, "Availability check failed: {}", e);
                (false, Some(e.to_string()))
            }
        };

        if self.check_mut(kind).complete(id, available, error) {
            CheckOutcome::Applied { kind, id }
        } else {
            CheckOutcome::Discarded { kind, id }
        }
    }

    /// State of an availability query
    pub fn check_state(&self, kind: CheckKind) -> &AsyncCheckState {
        match kind {
            CheckKind::Nickname => self.nickname_check.state(),
            CheckKind::Email => self.email_check.state(),
        }
    }

    fn check_mut(&mut self, kind: CheckKind) -> &mut AsyncCheck {
        match kind {
            CheckKind::Nickname => &mut self.nickname_check,
            CheckKind::Email => &mut self.email_check,
        }
    }

    /// Check the password rules
    pub fn is_password_valid(&self) -> bool {
        self.password_valid.get(&self.values.with(|values| values.password.clone()))
    }

    /// Check whether the whole form may be submitted
    pub fn is_form_valid(&self) -> bool {
        let key = ValidityKey {
            values: self.values.get(),
            nickname_rejected: self.nickname_check.state().has_error(),
            email_rejected: self.email_check.state().has_error(),
        };
        self.form_valid.get(&key)
    }

    /// Inline error for a field, if any
    pub fn field_error(&self, field: Field) -> Option<FieldError> {
        self.values.with(|values| {
            let value = values.get(field);
            match field {
                Field::Name | Field::Surname => value.is_empty().then_some(FieldError::Empty),
                Field::Nickname => {
                    if value.is_empty() {
                        Some(FieldError::Empty)
                    } else {
                        self.nickname_check
                            .state()
                            .error()
                            .map(|e| FieldError::NicknameRejected(e.to_string()))
                    }
                }
                Field::Email => {
                    if value.is_empty() {
                        Some(FieldError::Empty)
                    } else if !is_valid_email(value) {
                        Some(FieldError::InvalidEmail)
                    } else {
                        self.email_check
                            .state()
                            .error()
                            .map(|e| FieldError::EmailRejected(e.to_string()))
                    }
                }
                Field::Password => password_error(value, self.config.min_password_length),
                Field::PasswordRepeat => {
                    if value.is_empty() {
                        Some(FieldError::Empty)
                    } else if value != values.password {
                        Some(FieldError::PasswordMismatch)
                    } else {
                        None
                    }
                }
            }
        })
    }

    /// Inline errors of every field that has one, in screen order
    pub fn field_errors(&self) -> Vec<(Field, FieldError)> {
        Field::ALL
            .iter()
            .filter_map(|&field| self.field_error(field).map(|error| (field, error)))
            .collect()
    }

    /// Email and password inputs appear once the personal fields are filled
    pub fn shows_credentials_section(&self) -> bool {
        self.values.with(|values| {
            !values.name.is_empty() && !values.surname.is_empty() && !values.nickname.is_empty()
        })
    }

    /// Show or hide the password characters
    pub fn toggle_password_visibility(&mut self) {
        self.password_visible.update(|visible| !visible);
    }

    /// Whether password characters are shown
    pub fn is_password_visible(&self) -> bool {
        self.password_visible.get()
    }

    /// Status of the registration request
    pub fn status(&self) -> RegistrationStatus {
        self.status
    }

    /// Whether the submit button is enabled
    pub fn can_submit(&self) -> bool {
        self.status == RegistrationStatus::Idle && self.is_form_valid()
    }

    /// Build the request a submit would send
    ///
    /// Name and surname are capitalized; everything else is sent as typed.
    pub fn registration_request(&self) -> Result<RegistrationRequest> {
        if !self.is_form_valid() {
            return Err(FormError::Validation(self.field_errors()));
        }

        Ok(self.values.with(|values| RegistrationRequest {
            name: capitalize(&values.name),
            surname: capitalize(&values.surname),
            nickname: values.nickname.clone(),
            email: values.email.clone(),
            password: values.password.clone(),
        }))
    }

    /// Register with the current values
    ///
    /// An invalid form fails with [`FormError::Validation`] without
    /// contacting the backend. On success the credentials are emitted as
    /// [`RegistrationEvent::CredentialsObtained`]; on failure the message is
    /// emitted as [`RegistrationEvent::ShowMessage`] and the form keeps its
    /// values for a retry.
    pub async fn submit(&mut self) -> Result<RegistrationRequest> {
        if self.status == RegistrationStatus::Loading {
            return Err(FormError::InProgress);
        }

        let request = self.registration_request()?;

        tracing::debug!(nickname = %request.nickname, "Submitting registration");
        let result = {
            let _loading = SubmitGuard::enter(&mut self.status);
            self.api.register(request.clone()).await
        };

        match result {
            Ok(credentials) => {
                tracing::debug!(nickname = %request.nickname, "Registration succeeded");
                self.emit(RegistrationEvent::CredentialsObtained(credentials));
                Ok(request)
            }
            Err(e) => {
                tracing::warn!("Registration failed: {}", e);
                self.emit(RegistrationEvent::ShowMessage(e.to_string()));
                Err(FormError::Registration(e))
            }
        }
    }

    /// Keyboard "done" action: submit only if the form is valid
    pub async fn submit_from_keyboard(&mut self) -> Option<Result<RegistrationRequest>> {
        if !self.can_submit() {
            return None;
        }
        Some(self.submit().await)
    }

    /// Ask the screen to switch to login
    pub fn navigate_to_login(&self) {
        self.emit(RegistrationEvent::NavigateTo(Screen::Login));
    }

    fn emit(&self, event: RegistrationEvent) {
        if let Err(e) = self.events.send(event) {
            tracing::debug!("Dropping registration event: {}", e);
        }
    }
}

impl fmt::Debug for RegistrationForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationForm")
            .field("nickname_check", self.nickname_check.state())
            .field("email_check", self.email_check.state())
            .field("status", &self.status)
            .field("pending_checks", &self.in_flight.len())
            .finish_non_exhaustive()
    }
}
