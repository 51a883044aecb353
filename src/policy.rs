//! Password strength and confirmation policy.

use std::sync::Arc;

use crate::collaborator::MessageKey;
use crate::collaborator::Notifier;

/// Minimum password length in characters.
pub const MINIMUM_PASSWORD_LENGTH: usize = 8;

/// Validates candidate passwords and reports violations through the
/// notification channel.
#[derive(Clone)]
pub struct PasswordPolicy {
    notifier: Arc<dyn Notifier>,
}

impl PasswordPolicy {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    /// Check `password` (and, when given, its confirmation).
    ///
    /// Returns `false` and notifies the user when the password is
    /// empty or shorter than [`MINIMUM_PASSWORD_LENGTH`], or when the
    /// confirmation does not match. No other side effects.
    pub fn is_valid(&self, password: &str, confirm_password: Option<&str>) -> bool {
        if password.chars().count() < MINIMUM_PASSWORD_LENGTH {
            self.notifier.notify(MessageKey::PasswordTooShort);
            return false;
        }

        if let Some(confirm) = confirm_password {
            if confirm != password {
                self.notifier.notify(MessageKey::PasswordConfirmationMismatch);
                return false;
            }
        }

        true
    }
}
