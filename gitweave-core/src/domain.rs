use crate::types::CommitRecord;

/// Domain of an email address without its top-level label.
///
/// `linux@cs.uwaterloo.ca` → `cs.uwaterloo`. Returns `None` unless the
/// address has exactly one `@`, a non-empty local part, and a dotted domain
/// with no empty labels.
pub fn email_domain(email: &str) -> Option<String> {
    let (local, domain) = email.split_once('@')?;
    if local.is_empty() || domain.contains('@') {
        return None;
    }
    if domain.split('.').any(str::is_empty) {
        return None;
    }
    let (name, _) = domain.rsplit_once('.')?;
    Some(name.to_string())
}

/// [`email_domain`] applied to the record's `email` tag.
pub fn make_domain(record: &CommitRecord) -> Option<String> {
    record.email.as_deref().and_then(email_domain)
}
