//! PCI group resolution.
//!
//! Cards behind the same PCI switch share bandwidth, so allocation on one
//! card can starve its siblings. The node publishes these groups in the
//! `gpu.intel.com/pci-groups` label (continued in `pci-groups2`, `pci-groups3`,
//! ... when the value is long):
//!
//! ```text
//! 0.1_2.3     two groups: {card0, card1} and {card2, card3}
//! ```

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::Node;
use serde::Serialize;

use crate::labels::{concatenate_split_label, node_labels};
use crate::PCI_GROUP_LABEL;

/// Separator between groups.
const GROUP_SEPARATOR: char = '_';

/// Separator between GPU numbers within one group.
const MEMBER_SEPARATOR: char = '.';

/// Card identifier prefix.
const CARD_PREFIX: &str = "card";

/// Decoded PCI groups of one node.
///
/// Each group lists GPU numbers (the numeric suffix of `card<N>`) in label
/// order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PciGroups {
    groups: Vec<Vec<String>>,
}

impl PciGroups {
    /// Parse a reassembled `pci-groups` label value.
    ///
    /// Empty groups and empty GPU numbers are skipped.
    pub fn parse(value: &str) -> Self {
        let groups = value
            .split(GROUP_SEPARATOR)
            .map(|group| {
                group
                    .split(MEMBER_SEPARATOR)
                    .filter(|num| !num.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .filter(|group| !group.is_empty())
            .collect();

        Self { groups }
    }

    /// Decode groups from a label mapping, following split-label continuations.
    pub fn from_labels(labels: &BTreeMap<String, String>) -> Self {
        Self::parse(&concatenate_split_label(labels, PCI_GROUP_LABEL))
    }

    /// Decode groups from a node.
    pub fn from_node(node: &Node) -> Self {
        Self::from_labels(node_labels(node))
    }

    /// The first group containing `gpu_name` (a `card<N>` identifier).
    pub fn group_of(&self, gpu_name: &str) -> Option<&[String]> {
        self.groups
            .iter()
            .find(|group| group.iter().any(|num| is_card(gpu_name, num)))
            .map(Vec::as_slice)
    }

    /// Iterate over groups in label order.
    pub fn groups(&self) -> impl Iterator<Item = &[String]> {
        self.groups.iter().map(Vec::as_slice)
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Check if the node declares no groups.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

fn is_card(gpu_name: &str, gpu_num: &str) -> bool {
    gpu_name
        .strip_prefix(CARD_PREFIX)
        .is_some_and(|num| num == gpu_num)
}

/// GPU numbers sharing `gpu_name`'s PCI group, including its own.
///
/// Empty when the node has no group label or the card is in no group.
pub fn pci_group(node: &Node, gpu_name: &str) -> Vec<String> {
    PciGroups::from_node(node)
        .group_of(gpu_name)
        .map(<[String]>::to_vec)
        .unwrap_or_default()
}

/// Check if `gpu_name` is in the same PCI group as `pci_group_gpu_name`.
pub fn is_gpu_in_pci_group(gpu_name: &str, pci_group_gpu_name: &str, node: &Node) -> bool {
    pci_group(node, pci_group_gpu_name)
        .iter()
        .any(|num| is_card(gpu_name, num))
}

/// Expand `card` into its whole PCI group, appending members not yet in `cards`.
///
/// Cards already present keep their position; new members are appended in
/// group order. A card without a group leaves `cards` unchanged.
pub fn add_pci_group_gpus(node: &Node, card: &str, mut cards: Vec<String>) -> Vec<String> {
    for gpu_num in pci_group(node, card) {
        let grouped = format!("{CARD_PREFIX}{gpu_num}");
        if !cards.contains(&grouped) {
            cards.push(grouped);
        }
    }

    cards
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups_node(parts: &[(&str, &str)]) -> Node {
        let mut node = Node::default();
        node.metadata.labels = Some(
            parts
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        );
        node
    }

    #[test]
    fn test_parse_groups() {
        let groups = PciGroups::parse("0.1_2.3.4");

        assert_eq!(groups.len(), 2);
        assert_eq!(groups.group_of("card3"), Some(&["2".to_string(), "3".to_string(), "4".to_string()][..]));
        assert_eq!(groups.group_of("card5"), None);
    }

    #[test]
    fn test_parse_skips_empty_tokens() {
        let groups = PciGroups::parse("0.1__.2..3_");

        let all: Vec<Vec<String>> = groups.groups().map(<[String]>::to_vec).collect();
        assert_eq!(all, vec![vec!["0", "1"], vec!["2", "3"]]);
        assert!(PciGroups::parse("").is_empty());
    }

    #[test]
    fn test_pci_group_lookup() {
        let node = groups_node(&[(PCI_GROUP_LABEL, "0.1_2.3")]);

        assert_eq!(pci_group(&node, "card1"), vec!["0", "1"]);
        assert_eq!(pci_group(&node, "card2"), vec!["2", "3"]);
        assert!(pci_group(&node, "card4").is_empty());
        assert!(pci_group(&node, "1").is_empty());
    }

    #[test]
    fn test_pci_group_without_label() {
        let node = Node::default();

        assert!(pci_group(&node, "card0").is_empty());
        assert!(!is_gpu_in_pci_group("card0", "card0", &node));
    }

    #[test]
    fn test_pci_group_follows_continuations() {
        let node = groups_node(&[
            (PCI_GROUP_LABEL, "0.1_2."),
            ("gpu.intel.com/pci-groups2", "3_4.5"),
            ("gpu.intel.com/pci-groups4", "_6.7"),
        ]);

        assert_eq!(pci_group(&node, "card3"), vec!["2", "3"]);
        assert_eq!(pci_group(&node, "card5"), vec!["4", "5"]);
        assert!(pci_group(&node, "card6").is_empty());
    }

    #[test]
    fn test_is_gpu_in_pci_group() {
        let node = groups_node(&[(PCI_GROUP_LABEL, "0.1_2.3")]);

        assert!(is_gpu_in_pci_group("card0", "card1", &node));
        assert!(is_gpu_in_pci_group("card1", "card1", &node));
        assert!(!is_gpu_in_pci_group("card2", "card1", &node));
    }

    #[test]
    fn test_add_pci_group_gpus() {
        let node = groups_node(&[(PCI_GROUP_LABEL, "0.1.2_3.4")]);

        let cards = add_pci_group_gpus(&node, "card1", vec!["card2".to_string()]);
        assert_eq!(cards, vec!["card2", "card0", "card1"]);

        let cards = add_pci_group_gpus(&node, "card9", vec!["card2".to_string()]);
        assert_eq!(cards, vec!["card2"]);
    }
}
