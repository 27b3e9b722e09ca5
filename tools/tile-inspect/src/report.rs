//! Resolved view of a Node/Pod snapshot.

use std::collections::BTreeSet;

use gas_topology::{
    container_requests, gpu_count, has_gpu_capacity, has_gpu_resources, is_completed_pod,
    pci_group, pod_card_tile_indices, same_gpu_container_names, tiles_per_gpu, ContainerRequests,
    NodeTileView, PciGroups, TileLabels,
};
use k8s_openapi::api::core::v1::{Node, Pod};
use serde::Serialize;
use tracing::{debug, info};

/// Everything the core resolves for one node.
#[derive(Debug, Serialize)]
pub struct NodeReport {
    pub name: Option<String>,
    pub has_gpu_capacity: bool,
    pub gpu_count: i64,
    pub tiles_per_gpu: Option<u32>,
    pub labels: TileLabels,
    pub view: NodeTileView,
    pub pci_groups: PciGroups,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pci_query: Option<PciQuery>,
}

/// PCI group of one queried card.
#[derive(Debug, Serialize)]
pub struct PciQuery {
    pub card: String,
    pub group: Vec<String>,
}

/// Everything the core resolves for one pod.
#[derive(Debug, Serialize)]
pub struct PodReport {
    pub name: Option<String>,
    pub completed: bool,
    pub requests_gpu: bool,
    pub same_gpu_containers: BTreeSet<String>,
    pub requests: ContainerRequests,
    pub committed_tiles: BTreeSet<String>,
}

/// Combined report.
#[derive(Debug, Serialize)]
pub struct Report {
    pub node: NodeReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pod: Option<PodReport>,
}

impl NodeReport {
    /// Resolve a node, optionally overriding its tile geometry.
    pub fn resolve(node: &Node, tiles_override: Option<u32>, card: Option<&str>) -> Self {
        let reported = tiles_per_gpu(node);
        let tiles = tiles_override.or(reported);
        if tiles_override.is_some() && reported.is_some() && tiles_override != reported {
            info!(?reported, ?tiles_override, "Overriding node tile geometry");
        }

        let report = Self {
            name: node.metadata.name.clone(),
            has_gpu_capacity: has_gpu_capacity(node),
            gpu_count: gpu_count(node),
            tiles_per_gpu: tiles,
            labels: TileLabels::from_node(node),
            view: NodeTileView::with_tiles_per_gpu(node, tiles),
            pci_groups: PciGroups::from_node(node),
            pci_query: card.map(|card| PciQuery {
                card: card.to_string(),
                group: pci_group(node, card),
            }),
        };

        debug!(
            node = report.name.as_deref().unwrap_or("<unnamed>"),
            disabled_cards = report.view.disabled.len(),
            preferred_cards = report.view.preferred.len(),
            pci_groups = report.pci_groups.len(),
            "Resolved node"
        );

        report
    }
}

impl PodReport {
    /// Resolve a pod.
    pub fn resolve(pod: &Pod) -> Self {
        let same_gpu_containers = same_gpu_container_names(pod);
        let requests = container_requests(pod, &same_gpu_containers);

        Self {
            name: pod.metadata.name.clone(),
            completed: is_completed_pod(pod),
            requests_gpu: has_gpu_resources(pod),
            same_gpu_containers,
            requests,
            committed_tiles: pod_card_tile_indices(pod),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gas_testing::{NodeBuilder, PodBuilder};
    use gas_topology::{GPU_PLUGIN_RESOURCE, PCI_GROUP_LABEL, TILES_RESOURCE, TILE_ANNOTATION};

    #[test]
    fn test_node_report() {
        let node = NodeBuilder::new("n1")
            .capacity(GPU_PLUGIN_RESOURCE, "2")
            .capacity(TILES_RESOURCE, "4")
            .label(PCI_GROUP_LABEL, "0.1")
            .policy_label("gas-tile-disable-card0_gt3", "true")
            .build();

        let report = NodeReport::resolve(&node, None, Some("card1"));

        assert!(report.has_gpu_capacity);
        assert_eq!(report.tiles_per_gpu, Some(2));
        assert!(report.view.disabled.tiles("card0").is_empty());
        assert_eq!(report.labels.disabled.tiles("card0"), &[3]);
        assert_eq!(report.pci_query.map(|q| q.group), Some(vec!["0".to_string(), "1".to_string()]));
    }

    #[test]
    fn test_override_changes_sanitizing() {
        let node = NodeBuilder::new("n1")
            .capacity(GPU_PLUGIN_RESOURCE, "2")
            .capacity(TILES_RESOURCE, "4")
            .policy_label("gas-tile-disable-card0_gt3", "true")
            .build();

        let report = NodeReport::resolve(&node, Some(4), None);

        assert_eq!(report.tiles_per_gpu, Some(4));
        assert_eq!(report.view.disabled.tiles("card0"), &[3]);
    }

    #[test]
    fn test_pod_report_serializes() {
        let pod = PodBuilder::new("p1")
            .annotation(TILE_ANNOTATION, "card0:gt1")
            .container("c", &[("gpu.intel.com/i915", "1")])
            .phase("Running")
            .build();

        let report = PodReport::resolve(&pod);
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["completed"], false);
        assert_eq!(json["requests_gpu"], true);
        assert_eq!(json["committed_tiles"], serde_json::json!(["0.1"]));
        assert_eq!(json["requests"]["resources"][0]["gpu.intel.com/i915"], 1);
    }
}
