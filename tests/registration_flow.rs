//! Registration flow integration tests
//!
//! End-to-end tests driving a registration session the way the screen does:
//! user edits, availability answers, submit, and event delivery.

use app_core::test_utils::{ApiCall, FakeAuthApi};
use cook_helper::{
    dispatch_pending, AsyncCheckState, AuthError, CheckKind, Field, FieldError, FormError,
    RegistrationConfig, RegistrationEvent, RegistrationForm, RegistrationRequest,
    RegistrationView, Screen,
};
use std::sync::Arc;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[derive(Default)]
struct ScreenSpy {
    messages: Vec<String>,
    credentials: Vec<(String, String, String)>,
    screens: Vec<Screen>,
}

impl RegistrationView for ScreenSpy {
    fn show_message(&mut self, text: &str) {
        self.messages.push(text.to_string());
    }

    fn credentials_obtained(&mut self, name: &str, email: &str, token: &str) {
        self.credentials.push((name.to_string(), email.to_string(), token.to_string()));
    }

    fn navigate(&mut self, screen: Screen) {
        self.screens.push(screen);
    }
}

/// Test a complete sign-up from empty form to credentials
#[tokio::test]
async fn test_full_registration() {
    init_tracing();
    let api = Arc::new(FakeAuthApi::new());
    let (mut form, mut events) = RegistrationForm::new(api.clone(), RegistrationConfig::default());

    // Personal fields first, as the screen reveals the rest afterwards
    form.set_field(Field::Name, " mARIA ");
    form.set_field(Field::Surname, "rossi");
    assert!(!form.shows_credentials_section());
    form.set_field(Field::Nickname, "pastaqueen");
    assert!(form.shows_credentials_section());

    form.set_field(Field::Email, "maria@rossi.it");
    form.set_field(Field::Password, "carbonara42");
    form.set_field(Field::PasswordRepeat, "carbonara42");
    assert!(form.check_state(CheckKind::Nickname).is_loading());
    assert!(form.check_state(CheckKind::Email).is_loading());

    form.settle_checks().await;
    assert_eq!(form.check_state(CheckKind::Email).available(), Some(true));
    assert!(form.can_submit());

    let request = form.submit().await.unwrap();
    assert_eq!(
        request,
        RegistrationRequest {
            name: "Maria".to_string(),
            surname: "Rossi".to_string(),
            nickname: "pastaqueen".to_string(),
            email: "maria@rossi.it".to_string(),
            password: "carbonara42".to_string(),
        }
    );

    let mut screen = ScreenSpy::default();
    assert_eq!(dispatch_pending(&mut screen, &mut events), 1);
    assert_eq!(
        screen.credentials,
        vec![(
            "Maria".to_string(),
            "maria@rossi.it".to_string(),
            "token-pastaqueen".to_string()
        )]
    );
    assert!(screen.messages.is_empty());
}

/// Test that only the latest nickname answer reaches the form
#[tokio::test]
async fn test_stale_nickname_answer_is_ignored() {
    init_tracing();
    let api = Arc::new(FakeAuthApi::new());
    api.take_nickname("alice2");
    let gate = api.hold("alice");
    let (mut form, _events) = RegistrationForm::new(api.clone(), RegistrationConfig::default());

    form.set_field(Field::Nickname, "alice");
    form.set_field(Field::Nickname, "alice2");

    // "alice2" (taken) answers, then the stale "alice" (free) answer arrives
    form.process_next_check().await;
    gate.notify_one();
    form.process_next_check().await;

    assert_eq!(
        form.check_state(CheckKind::Nickname),
        &AsyncCheckState::Result {
            available: false,
            error: Some("Nickname is already taken".to_string()),
        }
    );
    assert!(matches!(
        form.field_error(Field::Nickname),
        Some(FieldError::NicknameRejected(_))
    ));
}

/// Test the email syntax gate in front of the availability query
#[tokio::test]
async fn test_email_queries_only_for_valid_syntax() {
    init_tracing();
    let api = Arc::new(FakeAuthApi::new());
    let (mut form, _events) = RegistrationForm::new(api.clone(), RegistrationConfig::default());

    form.set_field(Field::Email, "not-an-email");
    form.set_field(Field::Email, "a@b.com");
    form.set_field(Field::Email, "a@b.com");
    form.set_field(Field::Email, "a@b.co");
    form.settle_checks().await;

    assert_eq!(
        api.calls(),
        vec![
            ApiCall::CheckEmail("a@b.com".to_string()),
            ApiCall::CheckEmail("a@b.co".to_string()),
        ]
    );
}

/// Test that a refused registration keeps the form for a retry
#[tokio::test]
async fn test_failed_registration_can_be_retried() {
    init_tracing();
    let api = Arc::new(FakeAuthApi::new());
    api.fail_registration(AuthError::Network("connection refused".to_string()));
    let (mut form, mut events) = RegistrationForm::new(api.clone(), RegistrationConfig::default());

    form.set_field(Field::Name, "tom");
    form.set_field(Field::Surname, "baker");
    form.set_field(Field::Nickname, "tbaker");
    form.set_field(Field::Email, "tom@baker.com");
    form.set_field(Field::Password, "sourdough1");
    form.set_field(Field::PasswordRepeat, "sourdough1");
    form.settle_checks().await;

    assert!(matches!(form.submit().await, Err(FormError::Registration(_))));

    let mut screen = ScreenSpy::default();
    dispatch_pending(&mut screen, &mut events);
    assert_eq!(screen.messages, vec!["Network error: connection refused".to_string()]);
    assert!(screen.credentials.is_empty());

    // Values survive and the user can try again
    assert!(form.can_submit());
    assert!(form.submit().await.is_err());
    assert_eq!(api.registrations(), 2);
}

/// Test that an invalid form never reaches the backend
#[tokio::test]
async fn test_invalid_submit_is_local_only() {
    init_tracing();
    let api = Arc::new(FakeAuthApi::new());
    let (mut form, mut events) = RegistrationForm::new(api.clone(), RegistrationConfig::default());

    form.set_field(Field::Name, "tom");
    form.set_field(Field::Password, "short1");

    match form.submit().await {
        Err(FormError::Validation(errors)) => {
            assert!(errors.contains(&(
                Field::Password,
                FieldError::PasswordTooShort { min_length: 8 }
            )));
            assert!(!errors.iter().any(|(field, _)| *field == Field::Name));
        }
        other => panic!("Expected validation error, got {:?}", other),
    }

    assert!(api.calls().is_empty());
    assert_eq!(form.check_state(CheckKind::Nickname), &AsyncCheckState::Idle);
    assert_eq!(form.check_state(CheckKind::Email), &AsyncCheckState::Idle);
    assert_eq!(events.try_next(), None);
}

/// Test the link to the login screen
#[tokio::test]
async fn test_navigate_to_login() {
    let api = Arc::new(FakeAuthApi::new());
    let (form, mut events) = RegistrationForm::new(api, RegistrationConfig::default());

    form.navigate_to_login();

    let mut screen = ScreenSpy::default();
    dispatch_pending(&mut screen, &mut events);
    assert_eq!(screen.screens, vec![Screen::Login]);
}

/// Test that dropping the form stops listening to pending queries
#[tokio::test]
async fn test_dropping_form_cancels_pending_checks() {
    let api = Arc::new(FakeAuthApi::new());
    let gate = api.hold("ghost");
    let (mut form, mut events) = RegistrationForm::new(api.clone(), RegistrationConfig::default());

    form.set_field(Field::Nickname, "ghost");
    assert_eq!(form.pending_checks(), 1);
    drop(form);
    gate.notify_one();

    // The stream ends because the form (the only sender) is gone
    assert_eq!(events.next().await, None::<RegistrationEvent>);
}

/// Test loading a stricter configuration from JSON
#[tokio::test]
async fn test_configured_password_length() {
    let config = RegistrationConfig::from_json_str(r#"{"minPasswordLength": 12}"#).unwrap();
    let api = Arc::new(FakeAuthApi::new());
    let (mut form, _events) = RegistrationForm::new(api, config);

    form.set_field(Field::Password, "tomato12345");
    assert!(!form.is_password_valid());
    assert_eq!(
        form.field_error(Field::Password),
        Some(FieldError::PasswordTooShort { min_length: 12 })
    );

    form.set_field(Field::Password, "tomato123456");
    assert!(form.is_password_valid());
}
