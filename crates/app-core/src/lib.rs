//! Core application logic for Cook Helper
//!
//! This crate contains the registration flow: field validation rules, the
//! authentication backend contract and the reactive registration form model.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod auth;
pub mod config;
pub mod registration;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod validation;

pub use auth::{AuthApi, AuthError, Credentials, RegistrationRequest};
pub use config::{ConfigError, RegistrationConfig};
pub use registration::{
    CheckKind, CheckOutcome, Field, FormError, FormValues, RegistrationEvent, RegistrationForm,
    RegistrationStatus, Screen,
};
pub use validation::FieldError;
