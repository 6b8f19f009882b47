//! Authenticated identity attached to each request

use crate::error::{GateError, Result};
use serde::{Deserialize, Serialize};

/// The authenticated principal derived from a verified token.
///
/// Produced only by successful token verification. Immutable once attached
/// to a request's processing context; lives only for that request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Opaque subject identifier
    pub subject: String,
    /// Contact address
    pub email: String,
    /// Role name (e.g. "admin", "staff", "customer")
    pub role: String,
}

impl Identity {
    /// Check whether this identity's role is in the required set.
    ///
    /// An empty set means any authenticated identity passes.
    pub fn has_role(&self, required: &[String]) -> bool {
        required.is_empty() || required.iter().any(|r| r == &self.role)
    }

    /// Require membership in the role set, returning `Forbidden` if missing
    pub fn require_role(&self, required: &[String]) -> Result<()> {
        if self.has_role(required) {
            Ok(())
        } else {
            Err(GateError::forbidden("role not permitted"))
        }
    }
}
