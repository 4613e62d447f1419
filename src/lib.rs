//! Cook Helper registration screen glue
//!
//! The screen owns a [`RegistrationForm`] and listens to its one-shot
//! events. This crate connects the event stream to whatever renders the
//! screen through the [`RegistrationView`] trait.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub use app_core::{
    AuthApi, AuthError, CheckKind, Credentials, Field, FieldError, FormError, RegistrationConfig,
    RegistrationEvent, RegistrationForm, RegistrationRequest, Screen,
};
pub use app_state::{AsyncCheckState, DerivedState, EventStream, MutableState};

/// Rendering side of the registration screen
pub trait RegistrationView {
    /// Show a transient notification
    fn show_message(&mut self, text: &str);

    /// Hand freshly obtained credentials to the rest of the app
    fn credentials_obtained(&mut self, name: &str, email: &str, token: &str);

    /// Switch to another screen
    fn navigate(&mut self, screen: Screen);
}

/// Deliver one event to the view
///
/// Events the view has no handler for are ignored. Returns whether the event
/// was handled.
pub fn dispatch_event(view: &mut impl RegistrationView, event: RegistrationEvent) -> bool {
    match event {
        RegistrationEvent::ShowMessage(text) => view.show_message(&text),
        RegistrationEvent::CredentialsObtained(credentials) => {
            view.credentials_obtained(&credentials.name, &credentials.email, &credentials.token)
        }
        RegistrationEvent::NavigateTo(screen) => view.navigate(screen),
        other => {
            tracing::trace!(?other, "Ignoring unhandled registration event");
            return false;
        }
    }
    true
}

/// Deliver every queued event to the view
///
/// Returns the number of events handled.
pub fn dispatch_pending(
    view: &mut impl RegistrationView,
    events: &mut EventStream<RegistrationEvent>,
) -> usize {
    events
        .drain()
        .into_iter()
        .map(|event| dispatch_event(view, event))
        .filter(|handled| *handled)
        .count()
}

/// Deliver events until the form is dropped
pub async fn run_event_loop(
    view: &mut impl RegistrationView,
    mut events: EventStream<RegistrationEvent>,
) {
    while let Some(event) = events.next().await {
        dispatch_event(view, event);
    }
}
