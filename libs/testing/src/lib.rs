//! Test fixtures for Kubernetes Node and Pod snapshots.
//!
//! Builders produce the same `k8s-openapi` objects the scheduler extender
//! receives from the API server, with only the fields GPU resolution reads.
//!
//! ```ignore
//! let node = NodeBuilder::new("worker-0")
//!     .capacity("gpu.intel.com/i915", "2")
//!     .label("gpu.intel.com/pci-groups", "0.1")
//!     .build();
//! ```

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{
    Container, Node, NodeStatus, Pod, PodSpec, PodStatus, ResourceRequirements,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;

/// Namespace used for tile-state labels in fixtures.
pub const TEST_POLICY_NAMESPACE: &str = "telemetry.aware.scheduling.test-policy";

/// Full label name for a tile-state label in the fixture namespace.
pub fn policy_label(name: &str) -> String {
    format!("{TEST_POLICY_NAMESPACE}/{name}")
}

/// Builder for Node snapshots.
#[derive(Debug, Clone, Default)]
pub struct NodeBuilder {
    name: String,
    labels: BTreeMap<String, String>,
    capacity: BTreeMap<String, Quantity>,
}

impl NodeBuilder {
    /// Start a node with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add a label.
    pub fn label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Add a tile-state label in the fixture policy namespace.
    pub fn policy_label(self, name: &str, value: impl Into<String>) -> Self {
        self.label(policy_label(name), value)
    }

    /// Add a capacity entry.
    pub fn capacity(mut self, resource: impl Into<String>, quantity: &str) -> Self {
        self.capacity
            .insert(resource.into(), Quantity(quantity.to_string()));
        self
    }

    /// Build the node.
    pub fn build(self) -> Node {
        let mut node = Node::default();
        node.metadata.name = Some(self.name);
        if !self.labels.is_empty() {
            node.metadata.labels = Some(self.labels);
        }
        if !self.capacity.is_empty() {
            node.status = Some(NodeStatus {
                capacity: Some(self.capacity),
                ..Default::default()
            });
        }
        node
    }
}

/// Builder for Pod snapshots.
#[derive(Debug, Clone, Default)]
pub struct PodBuilder {
    name: String,
    annotations: BTreeMap<String, String>,
    containers: Vec<Container>,
    phase: Option<String>,
    deleting: bool,
}

impl PodBuilder {
    /// Start a pod with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add an annotation.
    pub fn annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    /// Add a container with the given resource requests.
    pub fn container(mut self, name: impl Into<String>, requests: &[(&str, &str)]) -> Self {
        let requests: BTreeMap<String, Quantity> = requests
            .iter()
            .map(|(k, v)| (k.to_string(), Quantity(v.to_string())))
            .collect();

        self.containers.push(Container {
            name: name.into(),
            resources: Some(ResourceRequirements {
                requests: Some(requests),
                ..Default::default()
            }),
            ..Default::default()
        });
        self
    }

    /// Set the pod phase (`Pending`, `Running`, `Succeeded`, `Failed`, `Unknown`).
    pub fn phase(mut self, phase: impl Into<String>) -> Self {
        self.phase = Some(phase.into());
        self
    }

    /// Mark the pod as being deleted.
    pub fn deleting(mut self) -> Self {
        self.deleting = true;
        self
    }

    /// Build the pod.
    pub fn build(self) -> Pod {
        let mut pod = Pod::default();
        pod.metadata.name = Some(self.name);
        if !self.annotations.is_empty() {
            pod.metadata.annotations = Some(self.annotations);
        }
        if self.deleting {
            pod.metadata.deletion_timestamp = Some(Time(chrono::Utc::now()));
        }
        pod.spec = Some(PodSpec {
            containers: self.containers,
            ..Default::default()
        });
        if let Some(phase) = self.phase {
            pod.status = Some(PodStatus {
                phase: Some(phase),
                ..Default::default()
            });
        }
        pod
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_builder() {
        let node = NodeBuilder::new("n1")
            .label("a", "b")
            .policy_label("gas-tile-disable-card0_gt0", "true")
            .capacity("gpu.intel.com/i915", "1")
            .build();

        let labels = node.metadata.labels.unwrap();
        assert_eq!(labels.get("a").map(String::as_str), Some("b"));
        assert!(labels.contains_key("telemetry.aware.scheduling.test-policy/gas-tile-disable-card0_gt0"));
        assert!(node.status.unwrap().capacity.unwrap().contains_key("gpu.intel.com/i915"));
    }

    #[test]
    fn test_pod_builder() {
        let pod = PodBuilder::new("p1")
            .container("c", &[("gpu.intel.com/i915", "1")])
            .phase("Running")
            .deleting()
            .build();

        assert_eq!(pod.spec.unwrap().containers.len(), 1);
        assert!(pod.metadata.deletion_timestamp.is_some());
        assert_eq!(pod.status.unwrap().phase.as_deref(), Some("Running"));
    }
}
