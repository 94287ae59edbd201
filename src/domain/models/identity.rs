use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Professional,
    Admin,
    Customer,
    Payments,
}

/// Caller identity vouched for by the external auth service.
/// Passed explicitly into every operation that needs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub subject: String,
    pub role: Role,
}

impl Identity {
    pub fn new(subject: impl Into<String>, role: Role) -> Self {
        Self { subject: subject.into(), role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Professionals act on their own schedule; admins on anyone's.
    pub fn can_manage(&self, professional_id: &str) -> bool {
        self.is_admin() || (self.role == Role::Professional && self.subject == professional_id)
    }
}
