/// Pulls the token out of an `Authorization: Bearer <token>` header value.
///
/// The value must consist of exactly two space-separated parts and the
/// scheme must be `Bearer` (any case). Anything else yields `None`.
pub fn parse_bearer(header: &str) -> Option<&str> {
    let mut parts = header.split(' ');
    let scheme = parts.next()?;
    let token = parts.next()?;
    if parts.next().is_some() || token.is_empty() || !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    Some(token)
}
