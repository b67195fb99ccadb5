//! Name comparison and name constraint matching helpers
//!
//! Distinguished name comparison follows the case-insensitive, whitespace-collapsing
//! matching profile from RFC 5280 section 7.1. Host-style matching for dNSName,
//! rfc822Name and uniformResourceIdentifier values operates on DNS labels, with
//! a leading period denoting a withinDomain constraint. iPAddress constraints are
//! expressed as an address followed by a mask of equal length.

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use der::asn1::ObjectIdentifier;
use der::{Tag, Tagged};
use x509_cert::attr::AttributeTypeAndValue;
use x509_cert::name::{Name, RelativeDistinguishedName};
use x509_cert::Certificate;

/// emailAddress attribute type from PKCS #9, used when enforcing rfc822Name
/// constraints against subject distinguished names
pub const PKCS9_EMAIL_ADDRESS: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.1");

/// `name_to_string` returns an RFC 4514-style string representation of a [`Name`].
pub fn name_to_string(name: &Name) -> String {
    name.to_string()
}

fn normalize(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut first = true;
    for part in value.split_whitespace() {
        if !first {
            out.push(' ');
        }
        out.push_str(&part.to_lowercase());
        first = false;
    }
    out
}

fn atv_value_matches(left: &AttributeTypeAndValue, right: &AttributeTypeAndValue) -> bool {
    if left.oid != right.oid {
        return false;
    }
    let string_tags = [Tag::PrintableString, Tag::Utf8String, Tag::Ia5String];
    let lt = left.value.tag();
    let rt = right.value.tag();
    if string_tags.contains(&lt) && string_tags.contains(&rt) {
        match (
            core::str::from_utf8(left.value.value()),
            core::str::from_utf8(right.value.value()),
        ) {
            (Ok(l), Ok(r)) => normalize(l) == normalize(r),
            _ => left.value == right.value,
        }
    } else {
        left.value == right.value
    }
}

fn rdn_matches(left: &RelativeDistinguishedName, right: &RelativeDistinguishedName) -> bool {
    let l = left.0.as_slice();
    let r = right.0.as_slice();
    if l.len() != r.len() {
        return false;
    }
    // RDNs are sets; find a match for each attribute irrespective of order
    l.iter()
        .all(|la| r.iter().any(|ra| atv_value_matches(la, ra)))
}

/// `compare_names` returns true when two distinguished names match per the
/// RFC 5280 name comparison rules (case-insensitive, internal whitespace collapsed).
pub fn compare_names(left: &Name, right: &Name) -> bool {
    if left.0.len() != right.0.len() {
        return false;
    }
    left.0
        .iter()
        .zip(right.0.iter())
        .all(|(l, r)| rdn_matches(l, r))
}

/// `is_self_issued` returns true when the subject and issuer fields of a
/// certificate match.
pub fn is_self_issued(cert: &Certificate) -> bool {
    compare_names(
        &cert.tbs_certificate.subject,
        &cert.tbs_certificate.issuer,
    )
}

/// `within_dn_subtree` returns true when `name` falls within the subtree rooted
/// at `subtree`, i.e., the RDNs of `subtree` are a leading sequence of the RDNs
/// of `name`. A subtree with no RDNs matches nothing.
pub fn within_dn_subtree(name: &Name, subtree: &Name) -> bool {
    if subtree.0.is_empty() || subtree.0.len() > name.0.len() {
        return false;
    }
    subtree
        .0
        .iter()
        .zip(name.0.iter())
        .all(|(s, n)| rdn_matches(s, n))
}

/// `within_domain` returns true when `candidate` is a strict subdomain of
/// `constraint`, i.e., it carries at least one additional label ahead of the
/// constraint's labels. A leading period on the constraint is ignored.
pub fn within_domain(candidate: &str, constraint: &str) -> bool {
    let constraint = constraint.strip_prefix('.').unwrap_or(constraint);
    let cons: Vec<&str> = constraint.split('.').collect();
    let cand: Vec<&str> = candidate.split('.').collect();
    if cand.len() <= cons.len() {
        return false;
    }
    let offset = cand.len() - cons.len();
    if cand[offset - 1].is_empty() {
        return false;
    }
    cons.iter()
        .enumerate()
        .all(|(i, label)| cand[offset + i].eq_ignore_ascii_case(label))
}

/// `dns_is_constrained` returns true when a dNSName value matches a dNSName
/// subtree, either exactly or as a subdomain.
pub fn dns_is_constrained(dns: &str, constraint: &str) -> bool {
    dns.eq_ignore_ascii_case(constraint) || within_domain(dns, constraint)
}

/// `email_is_constrained` returns true when an rfc822Name value matches an
/// rfc822Name subtree. A constraint containing '@' matches one mailbox, a
/// constraint with a leading period matches subdomains, and any other
/// constraint matches every mailbox on that host.
pub fn email_is_constrained(email: &str, constraint: &str) -> bool {
    let host = match email.rsplit_once('@') {
        Some((_, host)) => host,
        None => email,
    };
    if constraint.contains('@') {
        email.eq_ignore_ascii_case(constraint)
    } else if !constraint.starts_with('.') {
        host.eq_ignore_ascii_case(constraint)
    } else {
        within_domain(host, constraint)
    }
}

/// `extract_uri_host` returns the host component of a URI, with scheme,
/// userinfo, port and path removed.
pub fn extract_uri_host(uri: &str) -> &str {
    let mut sub = uri;
    if let Some(idx) = sub.find("://") {
        sub = &sub[idx + 3..];
    } else if let Some(idx) = sub.find(':') {
        // opaque URIs, e.g. ldap:host/...
        sub = &sub[idx + 1..];
    }
    if let Some(idx) = sub.find('@') {
        sub = &sub[idx + 1..];
    }
    if let Some(idx) = sub.find('/') {
        sub = &sub[..idx];
    }
    if let Some(idx) = sub.rfind(':') {
        if sub[idx + 1..].chars().all(|c| c.is_ascii_digit()) {
            sub = &sub[..idx];
        }
    }
    sub
}

/// `uri_is_constrained` returns true when a uniformResourceIdentifier value
/// matches a URI subtree. Constraints apply to the host component; a leading
/// period matches subdomains, otherwise the host must match exactly.
pub fn uri_is_constrained(uri: &str, constraint: &str) -> bool {
    let host = extract_uri_host(uri);
    if constraint.starts_with('.') {
        within_domain(host, constraint)
    } else {
        host.eq_ignore_ascii_case(constraint)
    }
}

/// `ip_is_constrained` returns true when an iPAddress value falls within an
/// iPAddress subtree. The constraint carries an address followed by a mask of
/// the same length; the candidate matches when `ip & mask == address & mask`.
pub fn ip_is_constrained(ip: &[u8], constraint: &[u8]) -> bool {
    if ip.is_empty() || ip.len() * 2 != constraint.len() {
        return false;
    }
    let (addr, mask) = constraint.split_at(ip.len());
    ip.iter()
        .zip(addr.iter())
        .zip(mask.iter())
        .all(|((i, a), m)| i & m == a & m)
}

/// `subnet_contains` returns true when the iPAddress subtree `inner` falls
/// entirely within the subtree `outer`. Both values carry an address followed
/// by a mask; containment requires the outer mask to cover no more bits than
/// the inner mask and the masked addresses to agree.
pub fn subnet_contains(outer: &[u8], inner: &[u8]) -> bool {
    if outer.len() != inner.len() || outer.is_empty() || outer.len() % 2 != 0 {
        return false;
    }
    let half = outer.len() / 2;
    let (o_addr, o_mask) = outer.split_at(half);
    let (i_addr, i_mask) = inner.split_at(half);
    let coarser = o_mask
        .iter()
        .zip(i_mask.iter())
        .all(|(om, im)| om & im == *om);
    let same_net = o_addr
        .iter()
        .zip(i_addr.iter())
        .zip(o_mask.iter())
        .all(|((oa, ia), om)| oa & om == ia & om);
    coarser && same_net
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::str::FromStr;

    #[test]
    fn dn_comparison() {
        let a = Name::from_str("CN=Alice,OU=Widget  Division,O=Example,C=US").unwrap();
        let b = Name::from_str("CN=alice,OU=widget division,O=example,C=us").unwrap();
        let c = Name::from_str("CN=Bob,OU=Widget Division,O=Example,C=US").unwrap();
        assert!(compare_names(&a, &b));
        assert!(!compare_names(&a, &c));
    }

    #[test]
    fn dn_subtree_containment() {
        let subtree = Name::from_str("O=Example,C=US").unwrap();
        // string DNs read most-specific-first; DER order puts C=US first
        let inside = Name::from_str("CN=Alice,OU=People,O=Example,C=US").unwrap();
        let outside = Name::from_str("CN=Alice,O=Other,C=US").unwrap();
        assert!(within_dn_subtree(&inside, &subtree));
        assert!(!within_dn_subtree(&outside, &subtree));
        assert!(!within_dn_subtree(&subtree, &inside));

        let empty = Name::default();
        assert!(!within_dn_subtree(&inside, &empty));
    }

    #[test]
    fn domain_matching() {
        assert!(within_domain("mail.example.com", "example.com"));
        assert!(within_domain("mail.example.com", ".example.com"));
        assert!(within_domain("a.b.example.com", "example.com"));
        assert!(!within_domain("example.com", "example.com"));
        assert!(!within_domain("badexample.com", "example.com"));
        assert!(!within_domain("example.org", "example.com"));

        assert!(dns_is_constrained("example.com", "example.com"));
        assert!(dns_is_constrained("EXAMPLE.com", "example.COM"));
        assert!(dns_is_constrained("mail.example.com", "example.com"));
        assert!(!dns_is_constrained("anexample.com", "example.com"));
    }

    #[test]
    fn email_matching() {
        assert!(email_is_constrained("user@example.com", "user@example.com"));
        assert!(email_is_constrained("User@Example.com", "user@example.com"));
        assert!(!email_is_constrained("other@example.com", "user@example.com"));
        assert!(email_is_constrained("user@example.com", "example.com"));
        assert!(!email_is_constrained("user@mail.example.com", "example.com"));
        assert!(email_is_constrained("user@mail.example.com", ".example.com"));
        assert!(!email_is_constrained("user@example.com", ".example.com"));
    }

    #[test]
    fn uri_matching() {
        assert_eq!("example.com", extract_uri_host("https://example.com/path"));
        assert_eq!("example.com", extract_uri_host("https://user@example.com:8443/p"));
        assert_eq!("example.com", extract_uri_host("ldap://example.com"));
        assert!(uri_is_constrained("https://example.com/x", "example.com"));
        assert!(uri_is_constrained("https://a.example.com/x", ".example.com"));
        assert!(!uri_is_constrained("https://a.example.com/x", "example.com"));
    }

    #[test]
    fn ip_matching() {
        // 192.168.0.0/16
        let constraint = [192u8, 168, 0, 0, 255, 255, 0, 0];
        assert!(ip_is_constrained(&[192, 168, 5, 9], &constraint));
        assert!(!ip_is_constrained(&[192, 169, 5, 9], &constraint));
        // mismatched family
        assert!(!ip_is_constrained(&[0u8; 16], &constraint));

        // 192.168.5.0/24 within 192.168.0.0/16 but not vice versa
        let narrow = [192u8, 168, 5, 0, 255, 255, 255, 0];
        assert!(subnet_contains(&constraint, &narrow));
        assert!(!subnet_contains(&narrow, &constraint));
        // disjoint
        let other = [10u8, 0, 0, 0, 255, 0, 0, 0];
        assert!(!subnet_contains(&constraint, &other));
    }
}
