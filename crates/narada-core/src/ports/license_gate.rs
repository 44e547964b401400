//! Gate consulted before starting license-bound services.

use crate::domain::LicenseState;

/// Read access to the last-known license state.
pub trait LicenseGate: Send + Sync {
    fn license_state(&self) -> LicenseState;

    fn is_licensed(&self) -> bool {
        self.license_state().is_valid()
    }
}

/// A gate that always reports the same state. Useful in tests and for
/// running services with licensing disabled.
#[derive(Debug, Clone, Default)]
pub struct StaticLicenseGate(pub LicenseState);

impl LicenseGate for StaticLicenseGate {
    fn license_state(&self) -> LicenseState {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::LicenseVerdict;

    #[test]
    fn unchecked_gate_is_closed() {
        assert!(!StaticLicenseGate::default().is_licensed());
    }

    #[test]
    fn valid_verdict_opens_gate() {
        let verdict = LicenseVerdict {
            valid: true,
            message: String::new(),
            drive: None,
            data: None,
            checked_at: Utc::now(),
        };
        assert!(StaticLicenseGate(LicenseState::Checked(verdict)).is_licensed());
    }
}
