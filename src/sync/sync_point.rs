use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::element::ElementKind;

pub type SyncPointId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncAction {
    Highlight,
    Pulse,
    Transform,
}

impl SyncAction {
    /// Fixed cycle by beat index over eight beats: highlight on the
    /// downbeat, transform at the half-way mark, pulse otherwise.
    pub fn for_beat(index: usize) -> Self {
        if index % 8 == 4 {
            SyncAction::Transform
        } else if index % 4 == 0 {
            SyncAction::Highlight
        } else {
            SyncAction::Pulse
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SyncAction::Highlight => "highlight",
            SyncAction::Pulse => "pulse",
            SyncAction::Transform => "transform",
        }
    }

    fn easing(&self) -> &'static str {
        match self {
            SyncAction::Highlight => "ease-out",
            SyncAction::Pulse | SyncAction::Transform => "ease-in-out",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SyncParams {
    pub intensity: f32,
    /// Seconds
    pub duration: f32,
}

/// A scheduled animation trigger tied to one beat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncPoint {
    pub id: SyncPointId,
    /// Seconds from the start of the track
    pub timestamp: f64,
    pub element_id: String,
    pub element_type: ElementKind,
    pub action: SyncAction,
    pub params: SyncParams,
}

/// What gets handed to the animation-apply collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationDescriptor {
    #[serde(rename = "type")]
    pub kind: String,
    pub duration: f32,
    pub delay: f32,
    pub easing: String,
    pub custom_params: BTreeMap<String, serde_json::Value>,
}

impl AnimationDescriptor {
    /// Build the descriptor for a firing sync point, scaling its intensity.
    pub fn from_sync_point(point: &SyncPoint, intensity_multiplier: f32) -> Self {
        let intensity = point.params.intensity * intensity_multiplier;

        let mut custom_params = BTreeMap::new();
        custom_params.insert("intensity".to_string(), serde_json::json!(intensity));
        custom_params.insert("scale".to_string(), serde_json::json!(1.0 + 0.1 * intensity));
        custom_params.insert(
            "elementType".to_string(),
            serde_json::json!(point.element_type.as_str()),
        );

        Self {
            kind: point.action.as_str().to_string(),
            duration: point.params.duration,
            delay: 0.0,
            easing: point.action.easing().to_string(),
            custom_params,
        }
    }

    pub fn intensity(&self) -> Option<f64> {
        self.custom_params.get("intensity").and_then(|v| v.as_f64())
    }
}
