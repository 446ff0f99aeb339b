//! Authorization for transit endpoints
//!
//! Callers identify themselves with two headers:
//! - `X-Role`: `administrator`, `companyOwner`, `driver` or `user`
//! - `X-Company-Id`: the company a company owner or driver works for
//!
//! Each operation declares an [`AuthPolicy`]. A missing or unknown role is
//! rejected with 401, an insufficient one with 403.

use crate::core::error::RequestError;
use axum::http::HeaderMap;

pub const ROLE_HEADER: &str = "x-role";
pub const COMPANY_HEADER: &str = "x-company-id";

/// Caller role
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Role {
    User,
    Driver,
    CompanyOwner,
    Administrator,
}

impl Role {
    /// Parse a role name (case-insensitive)
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "user" => Some(Role::User),
            "driver" => Some(Role::Driver),
            "companyowner" => Some(Role::CompanyOwner),
            "administrator" | "admin" => Some(Role::Administrator),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Driver => "driver",
            Role::CompanyOwner => "companyOwner",
            Role::Administrator => "administrator",
        }
    }
}

/// Authorization context extracted from a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub role: Role,
    pub company_id: Option<i64>,
}

impl AuthContext {
    pub fn administrator() -> Self {
        Self {
            role: Role::Administrator,
            company_id: None,
        }
    }

    pub fn company_member(role: Role, company_id: i64) -> Self {
        Self {
            role,
            company_id: Some(company_id),
        }
    }

    /// Check if context represents an administrator
    pub fn is_admin(&self) -> bool {
        self.role == Role::Administrator
    }

    /// Read the context from request headers
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, RequestError> {
        let raw_role = headers
            .get(ROLE_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| RequestError::Unauthorized {
                message: "missing X-Role header".to_string(),
            })?;

        let role = Role::parse(raw_role).ok_or_else(|| RequestError::Unauthorized {
            message: format!("unknown role '{}'", raw_role),
        })?;

        let company_id = headers
            .get(COMPANY_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<i64>().ok());

        Ok(Self { role, company_id })
    }
}

/// Authorization policy for an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPolicy {
    /// Any authenticated caller
    Authenticated,

    /// Drivers, company owners and administrators
    DriverAccess,

    /// Company owners and administrators
    CompanyAccess,

    /// Administrators only
    AdministratorAccess,
}

impl AuthPolicy {
    fn minimum_role(&self) -> Role {
        match self {
            AuthPolicy::Authenticated => Role::User,
            AuthPolicy::DriverAccess => Role::Driver,
            AuthPolicy::CompanyAccess => Role::CompanyOwner,
            AuthPolicy::AdministratorAccess => Role::Administrator,
        }
    }

    /// Check if auth context satisfies this policy
    pub fn check(&self, context: &AuthContext) -> bool {
        context.role >= self.minimum_role()
    }

    /// Check the policy, mapping a refusal to 403
    pub fn authorize(&self, context: &AuthContext) -> Result<(), RequestError> {
        if self.check(context) {
            Ok(())
        } else {
            Err(RequestError::Forbidden {
                message: format!(
                    "role '{}' does not satisfy {:?}",
                    context.role.as_str(),
                    self
                ),
            })
        }
    }

    /// Extract the context from headers and check the policy
    pub fn enforce(&self, headers: &HeaderMap) -> Result<AuthContext, RequestError> {
        let context = AuthContext::from_headers(headers)?;
        self.authorize(&context)?;
        Ok(context)
    }
}
