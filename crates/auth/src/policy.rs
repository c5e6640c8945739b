use crate::claims::IdentityClaim;

/// True iff an identity is present and carries the privileged role.
///
/// - No IO
/// - No panics
pub fn is_privileged(claim: Option<&IdentityClaim>) -> bool {
    claim.is_some_and(|c| c.role.is_privileged())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;

    #[test]
    fn only_admin_is_privileged() {
        let admin = IdentityClaim::new("a", "a@example.com", Role::Privileged);
        let user = IdentityClaim::new("u", "u@example.com", Role::Standard);

        assert!(is_privileged(Some(&admin)));
        assert!(!is_privileged(Some(&user)));
        assert!(!is_privileged(None));
    }
}
