use tracing::warn;

use crate::database::models::UserType;
use crate::error::ApiError;
use crate::middleware::AuthUser;

/// Authorization rules shared by every router.
#[derive(Debug, Clone, Copy)]
pub enum Policy<'a> {
    /// The caller owns the resource, or is an admin.
    SelfOrAdmin(i64),
    /// The caller is an organization account of this organization, or is an admin.
    OrgMemberOrAdmin(i64),
    /// The caller's user type is one of these.
    RoleIn(&'a [UserType]),
}

impl Policy<'_> {
    pub fn allows(&self, user: &AuthUser) -> bool {
        match *self {
            Policy::SelfOrAdmin(owner_id) => user.is_admin() || user.user_id == owner_id,
            Policy::OrgMemberOrAdmin(organization_id) => {
                user.is_admin()
                    || (user.user_type == UserType::Organization
                        && organization_id != 0
                        && user.organization_id == organization_id)
            }
            Policy::RoleIn(roles) => roles.contains(&user.user_type),
        }
    }

    /// `Forbidden(message)` unless the policy allows the caller.
    pub fn check(&self, user: &AuthUser, message: &str) -> Result<(), ApiError> {
        if self.allows(user) {
            Ok(())
        } else {
            warn!(user_id = user.user_id, policy = ?self, "Access denied: {}", message);
            Err(ApiError::forbidden(message))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller(user_id: i64, user_type: UserType, organization_id: i64) -> AuthUser {
        AuthUser {
            user_id,
            email: format!("user{}@leo.co.jp", user_id),
            user_type,
            organization_id,
            is_new: false,
            jti: "test".into(),
            exp: 0,
        }
    }

    #[test]
    fn self_or_admin() {
        let graduate = caller(3, UserType::Graduate, 0);
        assert!(Policy::SelfOrAdmin(3).allows(&graduate));
        assert!(!Policy::SelfOrAdmin(4).allows(&graduate));
        assert!(Policy::SelfOrAdmin(4).allows(&caller(7, UserType::Admin, 0)));
    }

    #[test]
    fn org_member_or_admin() {
        let org = caller(8, UserType::Organization, 3);
        assert!(Policy::OrgMemberOrAdmin(3).allows(&org));
        assert!(!Policy::OrgMemberOrAdmin(2).allows(&org));
        // Belonging to the organization is not enough without the organization role
        assert!(!Policy::OrgMemberOrAdmin(3).allows(&caller(5, UserType::Graduate, 3)));
        assert!(!Policy::OrgMemberOrAdmin(0).allows(&caller(9, UserType::Organization, 0)));
        assert!(Policy::OrgMemberOrAdmin(2).allows(&caller(7, UserType::Admin, 0)));
    }

    #[test]
    fn role_gate_reports_forbidden() {
        let graduate = caller(3, UserType::Graduate, 0);
        assert!(Policy::RoleIn(&[UserType::Graduate]).check(&graduate, "nope").is_ok());
        let err = Policy::RoleIn(&[UserType::Admin]).check(&graduate, "Admins only").unwrap_err();
        assert_eq!(err.status_code(), 403);
        assert_eq!(err.message(), "Admins only");
    }
}
