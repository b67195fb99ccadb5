//! Name constraints state maintained while walking a certification path
//!
//! Each supported name form carries a permitted bucket and an excluded bucket.
//! A permitted bucket of `None` means the form is unconstrained; `Some` with an
//! empty vector means an intersection produced the empty set, so no name of
//! that form is acceptable. Excluded buckets only ever grow (union semantics).

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use core::str::FromStr;

use x509_cert::ext::pkix::constraints::name::GeneralSubtrees;
use x509_cert::ext::pkix::name::GeneralName;
use x509_cert::ext::pkix::SubjectAltName;
use x509_cert::name::Name;

use crate::util::error::{Error, NameForm, PathValidationStatus, Result};
use crate::util::name_utils::{
    compare_names, dns_is_constrained, email_is_constrained, ip_is_constrained, subnet_contains,
    uri_is_constrained, within_dn_subtree, within_domain, PKCS9_EMAIL_ADDRESS,
};
use crate::validator::path_settings::NameConstraintsSettings;

/// Permitted and excluded subtrees for the name forms subject to constraint
/// processing, plus a flag recording that an unsupported constraint form was
/// observed in the path.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct NameConstraintsState {
    /// Permitted directoryName subtrees; None when unconstrained
    pub permitted_directory_name: Option<Vec<Name>>,
    /// Permitted rfc822Name subtrees; None when unconstrained
    pub permitted_rfc822_name: Option<Vec<String>>,
    /// Permitted dNSName subtrees; None when unconstrained
    pub permitted_dns_name: Option<Vec<String>>,
    /// Permitted uniformResourceIdentifier subtrees; None when unconstrained
    pub permitted_uniform_resource_identifier: Option<Vec<String>>,
    /// Permitted iPAddress subtrees (address then mask); None when unconstrained
    pub permitted_ip_address: Option<Vec<Vec<u8>>>,
    /// Excluded directoryName subtrees
    pub excluded_directory_name: Vec<Name>,
    /// Excluded rfc822Name subtrees
    pub excluded_rfc822_name: Vec<String>,
    /// Excluded dNSName subtrees
    pub excluded_dns_name: Vec<String>,
    /// Excluded uniformResourceIdentifier subtrees
    pub excluded_uniform_resource_identifier: Vec<String>,
    /// Excluded iPAddress subtrees (address then mask)
    pub excluded_ip_address: Vec<Vec<u8>>,
    /// Set when a subtree used a name form or minimum/maximum field this
    /// implementation does not process
    pub unsupported_constraint: bool,
}

#[derive(Default)]
struct SubtreeBuckets {
    directory_name: Vec<Name>,
    rfc822_name: Vec<String>,
    dns_name: Vec<String>,
    uniform_resource_identifier: Vec<String>,
    ip_address: Vec<Vec<u8>>,
    unsupported: bool,
}

fn decompose(subtrees: &GeneralSubtrees) -> SubtreeBuckets {
    let mut buckets = SubtreeBuckets::default();
    for subtree in subtrees {
        if subtree.minimum != 0 || subtree.maximum.is_some() {
            buckets.unsupported = true;
            continue;
        }
        match &subtree.base {
            GeneralName::DirectoryName(dn) => buckets.directory_name.push(dn.clone()),
            GeneralName::Rfc822Name(v) => buckets.rfc822_name.push(v.to_string()),
            GeneralName::DnsName(v) => buckets.dns_name.push(v.to_string()),
            GeneralName::UniformResourceIdentifier(v) => {
                buckets.uniform_resource_identifier.push(v.to_string())
            }
            GeneralName::IpAddress(v) => buckets.ip_address.push(v.as_bytes().to_vec()),
            _ => buckets.unsupported = true,
        }
    }
    buckets
}

fn strip_dot(value: &str) -> &str {
    value.strip_prefix('.').unwrap_or(value)
}

fn dn_subtree_contains(outer: &Name, inner: &Name) -> bool {
    within_dn_subtree(inner, outer)
}

fn dns_subtree_contains(outer: &str, inner: &str) -> bool {
    dns_is_constrained(strip_dot(inner), outer)
}

fn email_subtree_contains(outer: &str, inner: &str) -> bool {
    if inner.contains('@') {
        return email_is_constrained(inner, outer);
    }
    if outer.contains('@') {
        return false;
    }
    let host = strip_dot(inner);
    if outer.starts_with('.') {
        within_domain(host, outer) || host.eq_ignore_ascii_case(strip_dot(outer))
    } else {
        // an exact-host constraint cannot contain a subdomain pattern
        !inner.starts_with('.') && host.eq_ignore_ascii_case(outer)
    }
}

fn uri_subtree_contains(outer: &str, inner: &str) -> bool {
    let host = strip_dot(inner);
    if outer.starts_with('.') {
        within_domain(host, outer) || host.eq_ignore_ascii_case(strip_dot(outer))
    } else {
        !inner.starts_with('.') && host.eq_ignore_ascii_case(outer)
    }
}

fn intersect<T: Clone>(
    current: &mut Option<Vec<T>>,
    incoming: Vec<T>,
    contains: impl Fn(&T, &T) -> bool,
) {
    if incoming.is_empty() {
        return;
    }
    match current {
        None => *current = Some(incoming),
        Some(cur) => {
            let mut result = Vec::new();
            for old in cur.iter() {
                for new in incoming.iter() {
                    if contains(new, old) {
                        result.push(old.clone());
                    } else if contains(old, new) {
                        result.push(new.clone());
                    }
                }
            }
            *cur = result;
        }
    }
}

fn ip_intersect(current: &mut Option<Vec<Vec<u8>>>, incoming: Vec<Vec<u8>>) {
    intersect(current, incoming, |outer, inner| {
        subnet_contains(outer, inner)
    });
}

impl NameConstraintsState {
    /// Builds the initial state from configured permitted and excluded
    /// subtrees per RFC 5280 6.1.1 (e) and (f).
    pub fn from_settings(
        permitted: Option<&NameConstraintsSettings>,
        excluded: Option<&NameConstraintsSettings>,
    ) -> Result<Self> {
        let mut state = NameConstraintsState::default();
        if let Some(permitted) = permitted {
            state.permitted_directory_name = parse_dns(permitted.directory_name.as_deref())?;
            state.permitted_rfc822_name = permitted.rfc822_name.clone();
            state.permitted_dns_name = permitted.dns_name.clone();
            state.permitted_uniform_resource_identifier =
                permitted.uniform_resource_identifier.clone();
            state.permitted_ip_address = permitted.ip_address.clone();
        }
        if let Some(excluded) = excluded {
            state.excluded_directory_name =
                parse_dns(excluded.directory_name.as_deref())?.unwrap_or_default();
            state.excluded_rfc822_name = excluded.rfc822_name.clone().unwrap_or_default();
            state.excluded_dns_name = excluded.dns_name.clone().unwrap_or_default();
            state.excluded_uniform_resource_identifier = excluded
                .uniform_resource_identifier
                .clone()
                .unwrap_or_default();
            state.excluded_ip_address = excluded.ip_address.clone().unwrap_or_default();
        }
        Ok(state)
    }

    /// Intersects the permitted buckets with the permittedSubtrees of a
    /// nameConstraints extension per RFC 5280 6.1.4 (g)(1). Only forms present
    /// in the extension are affected.
    pub fn intersect_permitted(&mut self, subtrees: &GeneralSubtrees) {
        let buckets = decompose(subtrees);
        self.unsupported_constraint |= buckets.unsupported;
        intersect(
            &mut self.permitted_directory_name,
            buckets.directory_name,
            |o, i| dn_subtree_contains(o, i),
        );
        intersect(
            &mut self.permitted_rfc822_name,
            buckets.rfc822_name,
            |o, i| email_subtree_contains(o, i),
        );
        intersect(&mut self.permitted_dns_name, buckets.dns_name, |o, i| {
            dns_subtree_contains(o, i)
        });
        intersect(
            &mut self.permitted_uniform_resource_identifier,
            buckets.uniform_resource_identifier,
            |o, i| uri_subtree_contains(o, i),
        );
        ip_intersect(&mut self.permitted_ip_address, buckets.ip_address);
    }

    /// Unions the excluded buckets with the excludedSubtrees of a
    /// nameConstraints extension per RFC 5280 6.1.4 (g)(2).
    pub fn union_excluded(&mut self, subtrees: &GeneralSubtrees) {
        let buckets = decompose(subtrees);
        self.unsupported_constraint |= buckets.unsupported;
        self.excluded_directory_name.extend(buckets.directory_name);
        self.excluded_rfc822_name.extend(buckets.rfc822_name);
        self.excluded_dns_name.extend(buckets.dns_name);
        self.excluded_uniform_resource_identifier
            .extend(buckets.uniform_resource_identifier);
        self.excluded_ip_address.extend(buckets.ip_address);
    }

    /// Confirms a subject distinguished name against the directoryName
    /// constraints, including any emailAddress attribute values against the
    /// rfc822Name constraints.
    pub fn check_subject(&self, subject: &Name) -> Result<()> {
        // an empty subject is only acceptable alongside a SAN; name chaining
        // enforces that elsewhere
        if !subject.0.is_empty() {
            self.check_directory_name(subject)?;
        }
        for rdn in subject.0.iter() {
            for atv in rdn.0.iter() {
                if atv.oid == PKCS9_EMAIL_ADDRESS {
                    if let Ok(email) = core::str::from_utf8(atv.value.value()) {
                        self.check_rfc822_name(email)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Confirms each name in a subjectAltName extension against the
    /// constraints for its form. Unconstrained forms pass.
    pub fn check_san(&self, san: &SubjectAltName) -> Result<()> {
        for gn in san.0.iter() {
            match gn {
                GeneralName::DirectoryName(dn) => self.check_directory_name(dn)?,
                GeneralName::Rfc822Name(v) => self.check_rfc822_name(v.as_str())?,
                GeneralName::DnsName(v) => self.check_dns_name(v.as_str())?,
                GeneralName::UniformResourceIdentifier(v) => self.check_uri(v.as_str())?,
                GeneralName::IpAddress(v) => self.check_ip_address(v.as_bytes())?,
                _ => {}
            }
        }
        Ok(())
    }

    /// Confirms a distinguished name against the directoryName constraints.
    pub fn check_directory_name(&self, name: &Name) -> Result<()> {
        for excluded in &self.excluded_directory_name {
            if within_dn_subtree(name, excluded) || compare_names(name, excluded) {
                return Err(violation(NameForm::DirectoryName));
            }
        }
        if let Some(permitted) = &self.permitted_directory_name {
            if !permitted.iter().any(|p| within_dn_subtree(name, p)) {
                return Err(violation(NameForm::DirectoryName));
            }
        }
        Ok(())
    }

    /// Confirms an rfc822Name value against the rfc822Name constraints.
    pub fn check_rfc822_name(&self, email: &str) -> Result<()> {
        check_string_form(
            email,
            self.permitted_rfc822_name.as_deref(),
            &self.excluded_rfc822_name,
            email_is_constrained,
            NameForm::Rfc822Name,
        )
    }

    /// Confirms a dNSName value against the dNSName constraints.
    pub fn check_dns_name(&self, dns: &str) -> Result<()> {
        check_string_form(
            dns,
            self.permitted_dns_name.as_deref(),
            &self.excluded_dns_name,
            dns_is_constrained,
            NameForm::DnsName,
        )
    }

    /// Confirms a uniformResourceIdentifier value against the URI constraints.
    pub fn check_uri(&self, uri: &str) -> Result<()> {
        check_string_form(
            uri,
            self.permitted_uniform_resource_identifier.as_deref(),
            &self.excluded_uniform_resource_identifier,
            uri_is_constrained,
            NameForm::UniformResourceIdentifier,
        )
    }

    /// Confirms an iPAddress value against the iPAddress constraints.
    pub fn check_ip_address(&self, ip: &[u8]) -> Result<()> {
        for excluded in &self.excluded_ip_address {
            if ip_is_constrained(ip, excluded) {
                return Err(violation(NameForm::IpAddress));
            }
        }
        if let Some(permitted) = &self.permitted_ip_address {
            if !permitted.iter().any(|p| ip_is_constrained(ip, p)) {
                return Err(violation(NameForm::IpAddress));
            }
        }
        Ok(())
    }
}

fn violation(form: NameForm) -> Error {
    Error::PathValidation(PathValidationStatus::NameConstraintsViolation(form))
}

fn check_string_form(
    value: &str,
    permitted: Option<&[String]>,
    excluded: &[String],
    matches: impl Fn(&str, &str) -> bool,
    form: NameForm,
) -> Result<()> {
    for constraint in excluded {
        if matches(value, constraint) {
            return Err(violation(form));
        }
    }
    if let Some(permitted) = permitted {
        if !permitted.iter().any(|c| matches(value, c)) {
            return Err(violation(form));
        }
    }
    Ok(())
}

fn parse_dns(values: Option<&[String]>) -> Result<Option<Vec<Name>>> {
    match values {
        None => Ok(None),
        Some(values) => values
            .iter()
            .map(|s| Name::from_str(s).map_err(|_| Error::ParseError))
            .collect::<Result<Vec<_>>>()
            .map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use der::asn1::Ia5String;
    use x509_cert::ext::pkix::constraints::name::GeneralSubtree;

    fn dns_subtree(value: &str) -> GeneralSubtree {
        GeneralSubtree {
            base: GeneralName::DnsName(Ia5String::new(value).unwrap()),
            minimum: 0,
            maximum: None,
        }
    }

    fn dn_subtree(value: &str) -> GeneralSubtree {
        GeneralSubtree {
            base: GeneralName::DirectoryName(Name::from_str(value).unwrap()),
            minimum: 0,
            maximum: None,
        }
    }

    #[test]
    fn permitted_dns_intersection_narrows() {
        let mut state = NameConstraintsState::default();
        state.intersect_permitted(&vec![dns_subtree("example.com")]);
        assert!(state.check_dns_name("mail.example.com").is_ok());
        assert!(state.check_dns_name("example.org").is_err());

        state.intersect_permitted(&vec![dns_subtree("mail.example.com")]);
        assert!(state.check_dns_name("mail.example.com").is_ok());
        assert!(state.check_dns_name("www.example.com").is_err());

        // disjoint intersection leaves nothing permitted
        state.intersect_permitted(&vec![dns_subtree("example.net")]);
        assert_eq!(Some(&[] as &[String]), state.permitted_dns_name.as_deref());
        assert!(state.check_dns_name("mail.example.com").is_err());
    }

    #[test]
    fn excluded_dns_union_grows() {
        let mut state = NameConstraintsState::default();
        state.union_excluded(&vec![dns_subtree("bad.example.com")]);
        assert!(state.check_dns_name("good.example.com").is_ok());
        assert!(state.check_dns_name("bad.example.com").is_err());
        assert!(state.check_dns_name("worse.bad.example.com").is_err());

        state.union_excluded(&vec![dns_subtree("example.net")]);
        assert!(state.check_dns_name("a.example.net").is_err());
        assert!(state.check_dns_name("good.example.com").is_ok());
    }

    #[test]
    fn directory_name_constraints() {
        let mut state = NameConstraintsState::default();
        state.intersect_permitted(&vec![dn_subtree("O=Example,C=US")]);
        let inside = Name::from_str("CN=Alice,O=Example,C=US").unwrap();
        let outside = Name::from_str("CN=Alice,O=Other,C=US").unwrap();
        assert!(state.check_subject(&inside).is_ok());
        assert_eq!(
            Err(violation(NameForm::DirectoryName)),
            state.check_subject(&outside)
        );

        state.union_excluded(&vec![dn_subtree("OU=Blocked,O=Example,C=US")]);
        let blocked = Name::from_str("CN=Bob,OU=Blocked,O=Example,C=US").unwrap();
        assert!(state.check_subject(&blocked).is_err());
    }

    #[test]
    fn email_constraints_in_dn_and_san() {
        let mut state = NameConstraintsState::default();
        state.union_excluded(&vec![GeneralSubtree {
            base: GeneralName::Rfc822Name(Ia5String::new("example.net").unwrap()),
            minimum: 0,
            maximum: None,
        }]);
        assert!(state.check_rfc822_name("user@example.com").is_ok());
        assert!(state.check_rfc822_name("user@example.net").is_err());
    }

    #[test]
    fn ip_constraints() {
        let mut state = NameConstraintsState::default();
        let mut settings = NameConstraintsSettings::default();
        settings.ip_address = Some(vec![vec![192, 168, 0, 0, 255, 255, 0, 0]]);
        let from_settings =
            NameConstraintsState::from_settings(Some(&settings), None).unwrap();
        assert!(from_settings.check_ip_address(&[192, 168, 1, 1]).is_ok());
        assert!(from_settings.check_ip_address(&[10, 0, 0, 1]).is_err());

        // intersection keeps the narrower subnet
        state.intersect_permitted(&vec![GeneralSubtree {
            base: GeneralName::IpAddress(
                der::asn1::OctetString::new(vec![192u8, 168, 0, 0, 255, 255, 0, 0]).unwrap(),
            ),
            minimum: 0,
            maximum: None,
        }]);
        state.intersect_permitted(&vec![GeneralSubtree {
            base: GeneralName::IpAddress(
                der::asn1::OctetString::new(vec![192u8, 168, 5, 0, 255, 255, 255, 0]).unwrap(),
            ),
            minimum: 0,
            maximum: None,
        }]);
        assert!(state.check_ip_address(&[192, 168, 5, 7]).is_ok());
        assert!(state.check_ip_address(&[192, 168, 6, 7]).is_err());
    }

    #[test]
    fn unsupported_forms_flagged() {
        let mut state = NameConstraintsState::default();
        state.union_excluded(&vec![GeneralSubtree {
            base: GeneralName::RegisteredId(
                der::asn1::ObjectIdentifier::new_unwrap("1.2.3.4"),
            ),
            minimum: 0,
            maximum: None,
        }]);
        assert!(state.unsupported_constraint);

        let mut state = NameConstraintsState::default();
        state.intersect_permitted(&vec![GeneralSubtree {
            base: GeneralName::DnsName(Ia5String::new("example.com").unwrap()),
            minimum: 1,
            maximum: None,
        }]);
        assert!(state.unsupported_constraint);
        // the malformed subtree is skipped rather than applied
        assert!(state.permitted_dns_name.is_none());
    }
}
