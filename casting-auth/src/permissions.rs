use crate::claims::DecodedClaims;
use crate::error::AuthError;

/// Checks that verified claims grant `required`.
///
/// Matching is exact string membership. There is no wildcard, prefix or
/// hierarchical matching, so `get:movies` does not imply `get:movies:cast`.
/// A token without any permissions fails with `NoPermissionsGranted` before
/// the membership test is attempted.
pub fn enforce(claims: &DecodedClaims, required: &str) -> Result<(), AuthError> {
    if claims.permissions().is_empty() {
        return Err(AuthError::no_permissions());
    }
    if !claims.has_permission(required) {
        return Err(AuthError::permission_not_found());
    }
    Ok(())
}
