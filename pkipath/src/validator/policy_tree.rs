//! Valid-policy tree processing per RFC 5280 sections 6.1.2 through 6.1.5
//!
//! The tree is an arena: nodes live in a flat pool addressed by index, with one
//! row of indices per certificate depth. A null tree is represented by the
//! caller holding `Option<PolicyTree>::None`; an existing tree with rows is
//! never confused with the null tree.

use alloc::collections::BTreeMap;
use alloc::vec;
use alloc::vec::Vec;

use const_oid::db::rfc5280::ANY_POLICY;
use der::asn1::ObjectIdentifier;

use crate::validator::path_settings::ObjectIdentifierSet;

/// One node of the valid-policy tree
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PolicyNode {
    /// valid_policy from RFC 5280 6.1.2 (a)
    pub valid_policy: ObjectIdentifier,
    /// DER-encoded qualifier set associated with the policy, when present
    pub qualifier_set: Option<Vec<u8>>,
    /// Criticality of the certificatePolicies extension the node came from
    pub criticality_indicator: bool,
    /// expected_policy_set from RFC 5280 6.1.2 (a)
    pub expected_policy_set: ObjectIdentifierSet,
    /// Index of the parent node; None only for the root
    pub parent: Option<usize>,
    /// Indices of child nodes
    pub children: Vec<usize>,
}

/// Row of a [`FinalValidPolicyTree`]
pub type FinalValidPolicyTreeRow = Vec<ValidPolicyTreeNode>;

/// Detached representation of the valid-policy tree returned with validation
/// results
pub type FinalValidPolicyTree = Vec<FinalValidPolicyTreeRow>;

/// Node of a [`FinalValidPolicyTree`]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ValidPolicyTreeNode {
    /// valid_policy value for the node
    pub valid_policy: ObjectIdentifier,
    /// DER-encoded qualifier set, when present
    pub qualifier_set: Option<Vec<u8>>,
    /// Criticality of the certificatePolicies extension the node came from
    pub criticality_indicator: bool,
    /// expected_policy_set value for the node
    pub expected_policy_set: ObjectIdentifierSet,
}

/// Policy mappings grouped by issuer domain policy
pub type GroupedMappings = BTreeMap<ObjectIdentifier, ObjectIdentifierSet>;

/// Arena-based valid-policy tree
#[derive(Clone, Debug)]
pub struct PolicyTree {
    pool: Vec<PolicyNode>,
    rows: Vec<Vec<usize>>,
}

fn single(oid: ObjectIdentifier) -> ObjectIdentifierSet {
    let mut set = ObjectIdentifierSet::new();
    set.insert(oid);
    set
}

impl Default for PolicyTree {
    fn default() -> Self {
        Self::new()
    }
}

impl PolicyTree {
    /// Creates a tree initialized per RFC 5280 6.1.2 (a): a single root node
    /// with valid_policy anyPolicy and expected_policy_set {anyPolicy}.
    pub fn new() -> Self {
        let root = PolicyNode {
            valid_policy: ANY_POLICY,
            qualifier_set: None,
            criticality_indicator: false,
            expected_policy_set: single(ANY_POLICY),
            parent: None,
            children: vec![],
        };
        PolicyTree {
            pool: vec![root],
            rows: vec![vec![0]],
        }
    }

    /// Returns the node indices at `depth`, or an empty slice when the row
    /// does not exist.
    pub fn row(&self, depth: usize) -> &[usize] {
        match self.rows.get(depth) {
            Some(row) => row.as_slice(),
            None => &[],
        }
    }

    /// Returns a reference to the node at `index`.
    pub fn node(&self, index: usize) -> &PolicyNode {
        &self.pool[index]
    }

    fn ensure_row(&mut self, depth: usize) {
        while self.rows.len() <= depth {
            self.rows.push(vec![]);
        }
    }

    fn add_child(
        &mut self,
        parent: usize,
        depth: usize,
        valid_policy: ObjectIdentifier,
        qualifier_set: Option<Vec<u8>>,
        criticality_indicator: bool,
        expected_policy_set: ObjectIdentifierSet,
    ) -> usize {
        let index = self.pool.len();
        self.pool.push(PolicyNode {
            valid_policy,
            qualifier_set,
            criticality_indicator,
            expected_policy_set,
            parent: Some(parent),
            children: vec![],
        });
        self.pool[parent].children.push(index);
        self.ensure_row(depth);
        self.rows[depth].push(index);
        index
    }

    fn remove_node(&mut self, index: usize, depth: usize) {
        if let Some(parent) = self.pool[index].parent {
            self.pool[parent].children.retain(|c| *c != index);
        }
        if let Some(row) = self.rows.get_mut(depth) {
            row.retain(|c| *c != index);
        }
    }

    /// Processes the certificatePolicies values of the certificate at `depth`
    /// per RFC 5280 6.1.3 (d)(1) and (d)(2). `policies` carries each asserted
    /// policy with the DER encoding of its qualifiers; `any_policy_allowed` is
    /// true when inhibit_any_policy is greater than zero or the certificate is
    /// a self-issued intermediate; `critical` reflects the criticality of the
    /// certificatePolicies extension the values came from.
    pub fn process_policies(
        &mut self,
        depth: usize,
        policies: &[(ObjectIdentifier, Option<Vec<u8>>)],
        any_policy_allowed: bool,
        critical: bool,
    ) {
        debug_assert!(depth > 0);
        self.ensure_row(depth);

        // (d)(1): match each non-anyPolicy value against expected policy sets
        // of the previous depth, falling back to parents asserting anyPolicy
        for (policy, qualifiers) in policies {
            if *policy == ANY_POLICY {
                continue;
            }
            let parents: Vec<usize> = self.row(depth - 1).to_vec();
            let mut matched = false;
            for parent in &parents {
                if self.pool[*parent].expected_policy_set.contains(policy) {
                    self.add_child(
                        *parent,
                        depth,
                        *policy,
                        qualifiers.clone(),
                        critical,
                        single(*policy),
                    );
                    matched = true;
                }
            }
            if !matched {
                for parent in &parents {
                    if self.pool[*parent].valid_policy == ANY_POLICY {
                        self.add_child(
                            *parent,
                            depth,
                            *policy,
                            qualifiers.clone(),
                            critical,
                            single(*policy),
                        );
                        break;
                    }
                }
            }
        }

        // (d)(2): expand anyPolicy to every expected policy not already present
        if any_policy_allowed {
            if let Some((_, ap_qualifiers)) =
                policies.iter().find(|(policy, _)| *policy == ANY_POLICY)
            {
                let parents: Vec<usize> = self.row(depth - 1).to_vec();
                for parent in parents {
                    let expected: Vec<ObjectIdentifier> =
                        self.pool[parent].expected_policy_set.iter().copied().collect();
                    for policy in expected {
                        let already_present = self.pool[parent]
                            .children
                            .iter()
                            .any(|c| self.pool[*c].valid_policy == policy);
                        if !already_present {
                            self.add_child(
                                parent,
                                depth,
                                policy,
                                ap_qualifiers.clone(),
                                critical,
                                single(policy),
                            );
                        }
                    }
                }
            }
        }
    }

    /// Deletes childless nodes above `depth` per RFC 5280 6.1.3 (d)(3).
    /// Returns false when the root itself was left childless, i.e., the tree
    /// became null.
    pub fn prune(&mut self, depth: usize) -> bool {
        for d in (1..depth).rev() {
            let doomed: Vec<usize> = self
                .row(d)
                .iter()
                .copied()
                .filter(|i| self.pool[*i].children.is_empty())
                .collect();
            for index in doomed {
                self.remove_node(index, d);
            }
        }
        if depth > 0 && !self.pool[0].children.is_empty() {
            return true;
        }
        // a tree that has not grown past the root is not null
        depth == 0
    }

    /// Returns true when no nodes remain at `depth`.
    pub fn row_is_empty(&self, depth: usize) -> bool {
        self.row(depth).is_empty()
    }

    /// Applies policy mappings at `depth` per RFC 5280 6.1.4 (b)(1): nodes
    /// whose valid_policy matches an issuer domain policy take the mapped
    /// subject domain policies as their expected policy set, and an anyPolicy
    /// node stands in for absent issuer domain policies.
    pub fn apply_mappings(&mut self, depth: usize, mappings: &GroupedMappings) {
        for (idp, sdps) in mappings {
            let matches: Vec<usize> = self
                .row(depth)
                .iter()
                .copied()
                .filter(|i| self.pool[*i].valid_policy == *idp)
                .collect();
            if !matches.is_empty() {
                for index in matches {
                    self.pool[index].expected_policy_set = sdps.clone();
                }
                continue;
            }
            let any_node = self
                .row(depth)
                .iter()
                .copied()
                .find(|i| self.pool[*i].valid_policy == ANY_POLICY);
            if let Some(any_node) = any_node {
                let qualifiers = self.pool[any_node].qualifier_set.clone();
                let criticality = self.pool[any_node].criticality_indicator;
                if let Some(parent) = self.pool[any_node].parent {
                    self.add_child(parent, depth, *idp, qualifiers, criticality, sdps.clone());
                }
            }
        }
    }

    /// Deletes nodes at `depth` whose valid_policy matches an issuer domain
    /// policy, then prunes, per RFC 5280 6.1.4 (b)(2) when policy mapping is
    /// inhibited. Returns false when the tree became null.
    pub fn delete_mapped_nodes(&mut self, depth: usize, mappings: &GroupedMappings) -> bool {
        for idp in mappings.keys() {
            let matches: Vec<usize> = self
                .row(depth)
                .iter()
                .copied()
                .filter(|i| self.pool[*i].valid_policy == *idp)
                .collect();
            for index in matches {
                self.remove_node(index, depth);
            }
        }
        self.prune(depth)
    }

    fn valid_policy_node_set(&self) -> Vec<usize> {
        // nodes whose parent asserts anyPolicy, at any depth
        let mut set = vec![];
        for row in &self.rows[1..] {
            for index in row {
                if let Some(parent) = self.pool[*index].parent {
                    if self.pool[parent].valid_policy == ANY_POLICY {
                        set.push(*index);
                    }
                }
            }
        }
        set
    }

    fn depth_of(&self, index: usize) -> Option<usize> {
        self.rows.iter().position(|row| row.contains(&index))
    }

    /// Intersects the tree with the user-initial-policy-set per RFC 5280
    /// 6.1.5 (g)(iii). Returns false when the intersection is null.
    pub fn intersect_with_user_set(
        &mut self,
        depth: usize,
        user_set: &ObjectIdentifierSet,
    ) -> bool {
        // (g)(iii)(2): drop valid-policy-node-set members outside the user set
        for index in self.valid_policy_node_set() {
            let policy = self.pool[index].valid_policy;
            if policy != ANY_POLICY && !user_set.contains(&policy) {
                if let Some(d) = self.depth_of(index) {
                    self.remove_node(index, d);
                }
            }
        }

        // (g)(iii)(3): replace an anyPolicy leaf with the user policies that
        // are not already represented
        let any_node = self
            .row(depth)
            .iter()
            .copied()
            .find(|i| self.pool[*i].valid_policy == ANY_POLICY);
        if let Some(any_node) = any_node {
            let present: ObjectIdentifierSet = self
                .valid_policy_node_set()
                .iter()
                .filter(|i| self.depth_of(**i) == Some(depth))
                .map(|i| self.pool[*i].valid_policy)
                .collect();
            let qualifiers = self.pool[any_node].qualifier_set.clone();
            let criticality = self.pool[any_node].criticality_indicator;
            let parent = self.pool[any_node].parent;
            if let Some(parent) = parent {
                for policy in user_set {
                    if *policy != ANY_POLICY && !present.contains(policy) {
                        self.add_child(
                            parent,
                            depth,
                            *policy,
                            qualifiers.clone(),
                            criticality,
                            single(*policy),
                        );
                    }
                }
            }
            self.remove_node(any_node, depth);
        }

        // (g)(iii)(4)
        self.prune(depth)
    }

    /// Returns a detached copy of the tree for inclusion in validation results.
    pub fn final_tree(&self) -> FinalValidPolicyTree {
        self.rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|i| {
                        let node = &self.pool[*i];
                        ValidPolicyTreeNode {
                            valid_policy: node.valid_policy,
                            qualifier_set: node.qualifier_set.clone(),
                            criticality_indicator: node.criticality_indicator,
                            expected_policy_set: node.expected_policy_set.clone(),
                        }
                    })
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NIST_1: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.16.840.1.101.3.2.1.48.1");
    const NIST_2: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.16.840.1.101.3.2.1.48.2");
    const NIST_3: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.16.840.1.101.3.2.1.48.3");

    fn asserted(oids: &[ObjectIdentifier]) -> Vec<(ObjectIdentifier, Option<Vec<u8>>)> {
        oids.iter().map(|o| (*o, None)).collect()
    }

    #[test]
    fn policy_match_through_two_certs() {
        let mut tree = PolicyTree::new();
        tree.process_policies(1, &asserted(&[NIST_1, NIST_2]), true, false);
        assert!(tree.prune(1));
        assert_eq!(2, tree.row(1).len());

        tree.process_policies(2, &asserted(&[NIST_1]), false, false);
        assert!(tree.prune(2));
        assert_eq!(1, tree.row(2).len());
        let leaf = tree.node(tree.row(2)[0]);
        assert_eq!(NIST_1, leaf.valid_policy);
        // the NIST_2 branch lost its children and was pruned
        assert_eq!(1, tree.row(1).len());
    }

    #[test]
    fn criticality_carried_into_nodes() {
        let mut tree = PolicyTree::new();
        tree.process_policies(1, &asserted(&[NIST_1]), false, true);
        assert!(tree.prune(1));
        assert!(tree.node(tree.row(1)[0]).criticality_indicator);

        tree.process_policies(2, &asserted(&[NIST_1]), false, false);
        assert!(tree.prune(2));
        let detached = tree.final_tree();
        assert!(detached[1][0].criticality_indicator);
        assert!(!detached[2][0].criticality_indicator);
    }

    #[test]
    fn disjoint_policies_leave_row_empty() {
        let mut tree = PolicyTree::new();
        tree.process_policies(1, &asserted(&[NIST_1]), false, false);
        assert!(tree.prune(1));
        tree.process_policies(2, &asserted(&[NIST_2]), false, false);
        assert!(tree.row_is_empty(2));
    }

    #[test]
    fn any_policy_expands_expected_set() {
        let mut tree = PolicyTree::new();
        tree.process_policies(1, &asserted(&[ANY_POLICY]), true, false);
        assert!(tree.prune(1));
        // root expected {anyPolicy} expands to one anyPolicy child
        assert_eq!(1, tree.row(1).len());
        assert_eq!(ANY_POLICY, tree.node(tree.row(1)[0]).valid_policy);

        tree.process_policies(2, &asserted(&[NIST_1]), false, false);
        assert!(tree.prune(2));
        assert_eq!(NIST_1, tree.node(tree.row(2)[0]).valid_policy);
    }

    #[test]
    fn mapping_rewrites_expected_set() {
        let mut tree = PolicyTree::new();
        tree.process_policies(1, &asserted(&[NIST_1]), false, false);
        assert!(tree.prune(1));

        let mut mappings = GroupedMappings::new();
        let mut sdps = ObjectIdentifierSet::new();
        sdps.insert(NIST_2);
        sdps.insert(NIST_3);
        mappings.insert(NIST_1, sdps.clone());
        tree.apply_mappings(1, &mappings);
        assert_eq!(sdps, tree.node(tree.row(1)[0]).expected_policy_set);

        // the mapped-to policy now chains
        tree.process_policies(2, &asserted(&[NIST_2]), false, false);
        assert!(tree.prune(2));
        assert_eq!(NIST_2, tree.node(tree.row(2)[0]).valid_policy);
    }

    #[test]
    fn inhibited_mapping_deletes_nodes() {
        let mut tree = PolicyTree::new();
        tree.process_policies(1, &asserted(&[NIST_1]), false, false);
        assert!(tree.prune(1));

        let mut mappings = GroupedMappings::new();
        mappings.insert(NIST_1, single(NIST_2));
        assert!(!tree.delete_mapped_nodes(1, &mappings));
        assert!(tree.row_is_empty(1));
    }

    #[test]
    fn wrap_up_intersection_with_user_set() {
        let mut tree = PolicyTree::new();
        tree.process_policies(1, &asserted(&[NIST_1, NIST_2]), false, false);
        assert!(tree.prune(1));

        let user_set = single(NIST_1);
        assert!(tree.intersect_with_user_set(1, &user_set));
        assert_eq!(1, tree.row(1).len());
        assert_eq!(NIST_1, tree.node(tree.row(1)[0]).valid_policy);

        // disjoint user set nulls the tree
        let mut tree = PolicyTree::new();
        tree.process_policies(1, &asserted(&[NIST_1]), false, false);
        assert!(tree.prune(1));
        assert!(!tree.intersect_with_user_set(1, &single(NIST_3)));
    }

    #[test]
    fn any_policy_leaf_replaced_during_wrap_up() {
        let mut tree = PolicyTree::new();
        tree.process_policies(1, &asserted(&[ANY_POLICY]), true, false);
        assert!(tree.prune(1));

        let mut user_set = ObjectIdentifierSet::new();
        user_set.insert(NIST_1);
        user_set.insert(NIST_2);
        assert!(tree.intersect_with_user_set(1, &user_set));
        let policies: ObjectIdentifierSet = tree
            .row(1)
            .iter()
            .map(|i| tree.node(*i).valid_policy)
            .collect();
        assert_eq!(user_set, policies);
    }
}
