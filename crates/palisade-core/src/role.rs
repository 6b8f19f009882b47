//! Role gate: allow or deny an authenticated identity by role
//!
//! Pure decision, no side effects. Checks the missing-identity case
//! independently of the auth gate so the role gate composes and tests
//! standalone.

use crate::error::{GateError, Result};
use crate::gate::{Decision, Gate, GateContext, RequestMeta};
use crate::identity::Identity;

/// Allows or denies identities against a required role set
pub struct RoleGate {
    required: Vec<String>,
}

impl RoleGate {
    /// Create a role gate. An empty set means any authenticated identity
    /// passes.
    pub fn new<I, S>(required: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            required: required.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a role gate that only requires authentication
    pub fn any_authenticated() -> Self {
        Self { required: Vec::new() }
    }

    /// Check the identity against the required set.
    ///
    /// `None` fails with 401 "not authenticated"; a role outside a
    /// non-empty set fails with 403 "role not permitted".
    pub fn authorize(&self, identity: Option<&Identity>) -> Result<()> {
        let Some(identity) = identity else {
            return Err(GateError::unauthorized("not authenticated"));
        };

        identity.require_role(&self.required)
    }
}

impl Gate for RoleGate {
    fn evaluate(&self, _meta: &RequestMeta, ctx: &mut GateContext) -> Decision {
        match self.authorize(ctx.identity.as_ref()) {
            Ok(()) => Decision::Allow,
            Err(err) => Decision::Reject(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(role: &str) -> Identity {
        Identity {
            subject: "user-1".to_string(),
            email: "user@example.com".to_string(),
            role: role.to_string(),
        }
    }

    #[test]
    fn test_admin_allowed_for_admin_staff_set() {
        let gate = RoleGate::new(["admin", "staff"]);
        assert!(gate.authorize(Some(&identity("admin"))).is_ok());
    }

    #[test]
    fn test_customer_forbidden_for_admin_staff_set() {
        let gate = RoleGate::new(["admin", "staff"]);
        let err = gate.authorize(Some(&identity("customer"))).unwrap_err();
        assert_eq!(err.status(), 403);
        assert_eq!(err.to_string(), "forbidden: role not permitted");
    }

    #[test]
    fn test_empty_set_allows_any_authenticated() {
        let gate = RoleGate::any_authenticated();
        assert!(gate.authorize(Some(&identity("customer"))).is_ok());
    }

    #[test]
    fn test_missing_identity_is_unauthorized_not_forbidden() {
        let gate = RoleGate::new(["admin"]);
        let err = gate.authorize(None).unwrap_err();
        assert_eq!(err.status(), 401);
        assert_eq!(err.to_string(), "unauthorized: not authenticated");
    }

    #[test]
    fn test_gate_reads_identity_from_context() {
        let gate = RoleGate::new(["staff"]);
        let meta = RequestMeta::new("/api/admin", crate::gate::ClientKey::new("10.0.0.1"));

        let mut ctx = GateContext {
            identity: Some(identity("staff")),
        };
        assert!(matches!(gate.evaluate(&meta, &mut ctx), Decision::Allow));

        let mut empty = GateContext::default();
        assert!(matches!(
            gate.evaluate(&meta, &mut empty),
            Decision::Reject(GateError::Unauthorized { .. })
        ));
    }
}
