//! Control protocol - JSON command/response definitions

use serde::{Deserialize, Serialize};

/// Commands sent by a control client, one JSON object per line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", content = "params")]
pub enum ControlCommand {
    /// Health check
    Ping,
    /// Map, selection and display state
    GetViewerState,
    /// Load a payload or octree file
    LoadMap { path: String },
    /// Switch between raw and shaded rendering
    SetShading { enabled: bool },
    /// Switch camera projection ("perspective" or "orthographic")
    SetProjection { mode: String },
    /// Restrict rendering to an axis-aligned region
    SetRegion {
        min_x: f32,
        max_x: f32,
        min_y: f32,
        max_y: f32,
        min_z: f32,
        max_z: f32,
    },
    /// Render the whole map again
    ClearRegion,
    /// Focus the orbit target on the voxel under a screen position
    FocusAt { x: f32, y: f32 },
    /// Active camera pose and orbit target
    CameraGetState,
    /// Export the visible voxels as PLY files
    Export {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        directory: Option<String>,
    },
}

impl ControlCommand {
    /// Whether the command only reads state
    pub fn is_query(&self) -> bool {
        matches!(self, Self::Ping | Self::GetViewerState | Self::CameraGetState)
    }
}

/// Responses from the control server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum ControlResponse {
    #[serde(rename = "ok")]
    Ok { data: ResponseData },
    #[serde(rename = "error")]
    Error { message: String },
}

/// Axis-aligned bounds as min/max per axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundsInfo {
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
    pub min_z: f32,
    pub max_z: f32,
}

/// Response data variants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseData {
    ViewerState {
        has_map: bool,
        total_voxels: usize,
        visible_voxels: usize,
        resolution: Option<f32>,
        shading: bool,
        projection: String,
        region: Option<BoundsInfo>,
        bounds: Option<BoundsInfo>,
    },
    CameraState {
        projection: String,
        position: [f32; 3],
        forward: [f32; 3],
        target: [f32; 3],
        zoom: f32,
    },
    Pong { message: String },
    /// Mutation accepted; applied on the next frame
    Queued { description: String },
    None,
}

impl ControlResponse {
    pub fn ok(data: ResponseData) -> Self {
        Self::Ok { data }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self::Error {
            message: msg.into(),
        }
    }

    pub fn pong() -> Self {
        Self::ok(ResponseData::Pong {
            message: "pong".into(),
        })
    }

    pub fn queued(description: impl Into<String>) -> Self {
        Self::ok(ResponseData::Queued {
            description: description.into(),
        })
    }

    pub fn none() -> Self {
        Self::ok(ResponseData::None)
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_command_wire_format() {
        let cmd: ControlCommand = serde_json::from_str(r#"{"cmd":"Ping"}"#).unwrap();
        assert_eq!(cmd, ControlCommand::Ping);

        let cmd: ControlCommand =
            serde_json::from_str(r#"{"cmd":"SetShading","params":{"enabled":true}}"#).unwrap();
        assert_eq!(cmd, ControlCommand::SetShading { enabled: true });

        let cmd: ControlCommand = serde_json::from_value(json!({
            "cmd": "SetRegion",
            "params": {"min_x": -1, "max_x": 1, "min_y": 0, "max_y": 2, "min_z": 0, "max_z": 3}
        }))
        .unwrap();
        assert!(matches!(cmd, ControlCommand::SetRegion { max_z, .. } if max_z == 3.0));
    }

    #[test]
    fn test_export_directory_is_optional() {
        let cmd: ControlCommand = serde_json::from_str(r#"{"cmd":"Export","params":{}}"#).unwrap();
        assert_eq!(cmd, ControlCommand::Export { directory: None });
        assert!(!cmd.is_query());
        assert!(ControlCommand::GetViewerState.is_query());
    }

    #[test]
    fn test_unknown_command_rejected() {
        assert!(serde_json::from_str::<ControlCommand>(r#"{"cmd":"Screenshot"}"#).is_err());
    }

    #[test]
    fn test_response_wire_format() {
        assert_eq!(
            serde_json::to_value(ControlResponse::pong()).unwrap(),
            json!({"status": "ok", "data": {"message": "pong"}})
        );
        assert_eq!(
            serde_json::to_value(ControlResponse::error("No map data loaded")).unwrap(),
            json!({"status": "error", "message": "No map data loaded"})
        );
        assert_eq!(
            serde_json::to_value(ControlResponse::none()).unwrap(),
            json!({"status": "ok", "data": null})
        );
    }

    #[test]
    fn test_viewer_state_round_trip() {
        let response = ControlResponse::ok(ResponseData::ViewerState {
            has_map: true,
            total_voxels: 3,
            visible_voxels: 1,
            resolution: Some(0.1),
            shading: false,
            projection: "perspective".into(),
            region: None,
            bounds: Some(BoundsInfo { min_x: -1.0, max_x: 10.0, min_y: -3.0, max_y: 5.0, min_z: 0.0, max_z: 8.0 }),
        });
        let text = serde_json::to_string(&response).unwrap();
        assert_eq!(serde_json::from_str::<ControlResponse>(&text).unwrap(), response);
    }
}
