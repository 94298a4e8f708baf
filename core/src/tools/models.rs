//! kubectl JSON response parsing.

use serde::Deserialize;

use crate::error::{Error, Result};

/// Response structure for `kubectl get pods -o json`.
#[derive(Debug, Deserialize)]
pub struct PodListResponse {
    #[serde(default)]
    pub items: Vec<PodItem>,
}

#[derive(Debug, Deserialize)]
pub struct PodItem {
    #[serde(default)]
    pub metadata: Option<PodMetadata>,
    #[serde(default)]
    pub status: Option<PodStatus>,
}

#[derive(Debug, Deserialize)]
pub struct PodMetadata {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct PodStatus {
    #[serde(default)]
    pub conditions: Vec<PodCondition>,
}

#[derive(Debug, Deserialize)]
pub struct PodCondition {
    #[serde(rename = "type")]
    pub condition_type: String,
    pub status: String,
}

impl PodListResponse {
    /// Parses the output of `kubectl get pods -o json`.
    pub fn parse(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::MalformedResponse {
            context: "kubectl get pods".to_string(),
            reason: e.to_string(),
        })
    }

    /// Names of the pods reporting condition `Ready` with status `True`.
    pub fn ready_pods(&self) -> Vec<&str> {
        self.items
            .iter()
            .filter(|pod| pod.is_ready())
            .map(|pod| {
                pod.metadata
                    .as_ref()
                    .map(|m| m.name.as_str())
                    .unwrap_or("<unnamed>")
            })
            .collect()
    }
}

impl PodItem {
    pub fn is_ready(&self) -> bool {
        self.status.as_ref().is_some_and(|status| {
            status
                .conditions
                .iter()
                .any(|c| c.condition_type == "Ready" && c.status == "True")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const READY_LIST: &str = r#"{
        "apiVersion": "v1",
        "kind": "List",
        "items": [
            {
                "metadata": {"name": "ingress-nginx-admission-create-x"},
                "status": {"phase": "Succeeded", "conditions": [
                    {"type": "Ready", "status": "False", "reason": "PodCompleted"}
                ]}
            },
            {
                "metadata": {"name": "ingress-nginx-controller-7c6974c4d8-abcde"},
                "status": {"phase": "Running", "conditions": [
                    {"type": "Initialized", "status": "True"},
                    {"type": "Ready", "status": "True"},
                    {"type": "ContainersReady", "status": "True"}
                ]}
            }
        ]
    }"#;

    #[test]
    fn test_ready_pod_detected() {
        let pods = PodListResponse::parse(READY_LIST).unwrap();
        assert_eq!(
            pods.ready_pods(),
            vec!["ingress-nginx-controller-7c6974c4d8-abcde"]
        );
    }

    #[test]
    fn test_not_ready() {
        let empty = PodListResponse::parse(r#"{"items": []}"#).unwrap();
        assert!(empty.ready_pods().is_empty());

        let pending = PodListResponse::parse(
            r#"{"items": [{"status": {"phase": "Pending"}}]}"#,
        )
        .unwrap();
        assert!(pending.ready_pods().is_empty());

        let unready = PodListResponse::parse(
            r#"{"items": [{"status": {"conditions": [{"type": "ContainersReady", "status": "True"}]}}]}"#,
        )
        .unwrap();
        assert!(unready.ready_pods().is_empty());
    }

    #[test]
    fn test_malformed() {
        let err = PodListResponse::parse("No resources found in ingress-nginx namespace.").unwrap_err();
        assert!(matches!(err, Error::MalformedResponse { .. }));
    }
}
