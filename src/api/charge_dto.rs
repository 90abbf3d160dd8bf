use serde::{Deserialize, Serialize};

use crate::domain::utils::id::NodeId;
use crate::error::{Error, Result};

/// Body of a charge request: the stand of the aircraft to be charged.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargingRequestDto {
    #[serde(default, alias = "aircraftNode")]
    pub node_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChargingResponseDto {
    /// `true` means no vehicle could be assigned right now and the caller should retry later.
    pub wait: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargingCompletionRequestDto {
    #[serde(default, alias = "aircraftNode")]
    pub node_id: String,
}

impl ChargingRequestDto {
    pub fn new(node_id: impl Into<String>) -> Self {
        ChargingRequestDto { node_id: node_id.into() }
    }

    pub fn validate(&self) -> Result<NodeId> {
        required_node(&self.node_id)
    }
}

impl ChargingCompletionRequestDto {
    pub fn new(node_id: impl Into<String>) -> Self {
        ChargingCompletionRequestDto { node_id: node_id.into() }
    }

    pub fn validate(&self) -> Result<NodeId> {
        required_node(&self.node_id)
    }
}

impl ChargingResponseDto {
    pub fn wait() -> Self {
        ChargingResponseDto { wait: true }
    }

    pub fn dispatched() -> Self {
        ChargingResponseDto { wait: false }
    }
}

fn required_node(node_id: &str) -> Result<NodeId> {
    let node = NodeId::new(node_id.trim());
    if node.is_blank() {
        return Err(Error::Validation("NodeId is required".to_string()));
    }
    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_node_id_is_validation_error() {
        let dto: ChargingRequestDto = serde_json::from_str("{}").unwrap();
        assert!(matches!(dto.validate(), Err(Error::Validation(_))));

        let dto = ChargingCompletionRequestDto::new("  ");
        assert!(matches!(dto.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_accepts_both_field_names() {
        let dto: ChargingRequestDto = serde_json::from_str(r#"{"nodeId":"P-12"}"#).unwrap();
        assert_eq!(dto.validate().unwrap(), NodeId::new("P-12"));

        let dto: ChargingCompletionRequestDto = serde_json::from_str(r#"{"aircraftNode":"P-13"}"#).unwrap();
        assert_eq!(dto.validate().unwrap(), NodeId::new("P-13"));
    }

    #[test]
    fn test_response_wire_format() {
        assert_eq!(serde_json::to_string(&ChargingResponseDto::wait()).unwrap(), r#"{"wait":true}"#);
    }
}
