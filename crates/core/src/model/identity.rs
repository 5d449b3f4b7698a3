use crate::model::ids::{EmployeeId, UserId};

/// The learner's resolved identity.
///
/// Resolved once by the session loader from its fallback sources and passed
/// explicitly into every downstream call, instead of being re-read ambiently
/// at each call site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub employee_id: EmployeeId,
    pub user_id: UserId,
}

impl Identity {
    #[must_use]
    pub fn new(employee_id: EmployeeId, user_id: UserId) -> Self {
        Self {
            employee_id,
            user_id,
        }
    }
}
