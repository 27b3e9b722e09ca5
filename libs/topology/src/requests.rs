//! Per-container GPU resource requests and same-GPU grouping.

use std::collections::{BTreeMap, BTreeSet};

use k8s_openapi::api::core::v1::Pod;
use serde::Serialize;
use tracing::debug;

use crate::quantity::quantity_as_i64;
use crate::RESOURCE_PREFIX;

/// GPU resource name to requested integer quantity, for one container.
pub type ResourceMap = BTreeMap<String, i64>;

/// Container position to `true` for containers that must share one GPU.
///
/// Containers not named in the same-GPU annotation have no entry.
pub type SameGpuIndex = BTreeMap<usize, bool>;

/// GPU requests of a pod, one resource map per container in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContainerRequests {
    /// Containers that must be counted together on one GPU.
    pub same_gpu: SameGpuIndex,

    /// GPU-prefixed requests per container.
    pub resources: Vec<ResourceMap>,
}

impl ContainerRequests {
    /// Check if the container at `index` is part of the same-GPU group.
    pub fn is_same_gpu(&self, index: usize) -> bool {
        self.same_gpu.get(&index).copied().unwrap_or(false)
    }

    /// Resource maps of the same-GPU containers, in container order.
    pub fn same_gpu_resources(&self) -> impl Iterator<Item = &ResourceMap> {
        self.resources
            .iter()
            .enumerate()
            .filter(|(index, _)| self.is_same_gpu(*index))
            .map(|(_, resources)| resources)
    }

    /// Number of containers.
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Check if the pod has no containers.
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// Extract GPU requests for every container of `pod`.
///
/// Only resources whose name starts with `gpu.intel.com/` are kept. A quantity
/// without an exact integer value is recorded as 0 rather than failing the
/// extraction.
pub fn container_requests(
    pod: &Pod,
    same_gpu_container_names: &BTreeSet<String>,
) -> ContainerRequests {
    let mut extracted = ContainerRequests::default();

    let containers = pod.spec.as_ref().map(|s| s.containers.as_slice()).unwrap_or(&[]);

    for (index, container) in containers.iter().enumerate() {
        let mut resources = ResourceMap::new();

        let requests = container.resources.as_ref().and_then(|r| r.requests.as_ref());
        for (name, quantity) in requests.into_iter().flatten() {
            if !name.starts_with(RESOURCE_PREFIX) {
                continue;
            }

            let value = quantity_as_i64(quantity).unwrap_or_else(|e| {
                debug!(container = %container.name, resource = %name, error = %e, "Treating quantity as zero");
                0
            });
            resources.insert(name.clone(), value);
        }

        if same_gpu_container_names.contains(&container.name) {
            extracted.same_gpu.insert(index, true);
        }

        extracted.resources.push(resources);
    }

    extracted
}
