//! Cheap GPU presence and pod lifecycle checks.

use k8s_openapi::api::core::v1::{Node, Pod};

use crate::quantity::quantity_as_i64;
use crate::{GPU_PLUGIN_RESOURCE, RESOURCE_PREFIX};

const POD_FAILED: &str = "Failed";
const POD_SUCCEEDED: &str = "Succeeded";

/// Check if the node advertises a positive GPU plugin capacity.
pub fn has_gpu_capacity(node: &Node) -> bool {
    node.status
        .as_ref()
        .and_then(|s| s.capacity.as_ref())
        .and_then(|c| c.get(GPU_PLUGIN_RESOURCE))
        .and_then(|q| quantity_as_i64(q).ok())
        .is_some_and(|count| count > 0)
}

/// Check if any container requests a GPU-prefixed resource.
pub fn has_gpu_resources(pod: &Pod) -> bool {
    pod.spec
        .iter()
        .flat_map(|s| &s.containers)
        .filter_map(|c| c.resources.as_ref().and_then(|r| r.requests.as_ref()))
        .any(|requests| requests.keys().any(|name| name.starts_with(RESOURCE_PREFIX)))
}

/// Check if the pod is being deleted or has terminated.
///
/// Pending, Running, Unknown and missing phases are not completed.
pub fn is_completed_pod(pod: &Pod) -> bool {
    if pod.metadata.deletion_timestamp.is_some() {
        return true;
    }

    matches!(
        pod.status.as_ref().and_then(|s| s.phase.as_deref()),
        Some(POD_FAILED | POD_SUCCEEDED)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::{
        Container, NodeStatus, PodSpec, PodStatus, ResourceRequirements,
    };
    use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
    use rstest::rstest;

    fn node_with_capacity(resource: &str, quantity: &str) -> Node {
        Node {
            status: Some(NodeStatus {
                capacity: Some(
                    [(resource.to_string(), Quantity(quantity.to_string()))]
                        .into_iter()
                        .collect(),
                ),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[rstest]
    #[case("gpu.intel.com/i915", "2", true)]
    #[case("gpu.intel.com/i915", "0", false)]
    #[case("gpu.intel.com/i915", "garbage", false)]
    #[case("gpu.intel.com/tiles", "4", false)]
    fn test_has_gpu_capacity(#[case] resource: &str, #[case] quantity: &str, #[case] expected: bool) {
        assert_eq!(has_gpu_capacity(&node_with_capacity(resource, quantity)), expected);
    }

    #[test]
    fn test_node_without_status_has_no_capacity() {
        assert!(!has_gpu_capacity(&Node::default()));
    }

    #[rstest]
    #[case(None, false)]
    #[case(Some("Pending"), false)]
    #[case(Some("Running"), false)]
    #[case(Some("Unknown"), false)]
    #[case(Some("Failed"), true)]
    #[case(Some("Succeeded"), true)]
    fn test_is_completed_pod_by_phase(#[case] phase: Option<&str>, #[case] expected: bool) {
        let pod = Pod {
            status: Some(PodStatus {
                phase: phase.map(str::to_string),
                ..Default::default()
            }),
            ..Default::default()
        };

        assert_eq!(is_completed_pod(&pod), expected);
    }

    #[rstest]
    #[case(Some("Running"))]
    #[case(Some("Pending"))]
    #[case(None)]
    fn test_deleting_pod_is_completed(#[case] phase: Option<&str>) {
        let mut pod = Pod {
            status: Some(PodStatus {
                phase: phase.map(str::to_string),
                ..Default::default()
            }),
            ..Default::default()
        };
        pod.metadata.deletion_timestamp = Some(Time(chrono::Utc::now()));

        assert!(is_completed_pod(&pod));
    }

    fn pod_requesting(requests: &[&[(&str, &str)]]) -> Pod {
        let containers = requests
            .iter()
            .enumerate()
            .map(|(index, requests)| Container {
                name: format!("c{index}"),
                resources: Some(ResourceRequirements {
                    requests: Some(
                        requests
                            .iter()
                            .map(|(k, v)| (k.to_string(), Quantity(v.to_string())))
                            .collect(),
                    ),
                    ..Default::default()
                }),
                ..Default::default()
            })
            .collect();

        Pod {
            spec: Some(PodSpec {
                containers,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_has_gpu_resources() {
        assert!(has_gpu_resources(&pod_requesting(&[&[("gpu.intel.com/i915", "1")]])));
        assert!(has_gpu_resources(&pod_requesting(&[
            &[("cpu", "1")],
            &[("gpu.intel.com/tiles", "2")],
        ])));
        assert!(!has_gpu_resources(&pod_requesting(&[&[("cpu", "1"), ("memory", "1Gi")]])));
    }

    #[test]
    fn test_pod_without_spec_requests_nothing() {
        assert!(!has_gpu_resources(&Pod::default()));
    }
}
