//! Voxel data type

use serde::{Deserialize, Serialize};

use crate::core::types::Vec3;

/// One occupied cell of an occupancy map, as delivered by the converter
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Voxel {
    /// Cell centre
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// RGB888 colour
    pub color: [u8; 3],
    /// Edge length in world units; the map resolution when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f32>,
}

impl Voxel {
    /// Create a voxel with no explicit size
    pub fn new(x: f32, y: f32, z: f32, color: [u8; 3]) -> Self {
        Self { x, y, z, color, size: None }
    }

    /// Create a copy of this voxel with an explicit edge length
    pub fn with_size(self, size: f32) -> Self {
        Self { size: Some(size), ..self }
    }

    /// Centre as a vector
    pub fn center(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    /// Colour normalised to [0, 1]
    pub fn color_normalized(&self) -> [f32; 3] {
        [
            self.color[0] as f32 / 255.0,
            self.color[1] as f32 / 255.0,
            self.color[2] as f32 / 255.0,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_without_size() {
        let v: Voxel = serde_json::from_str(r#"{"x":1.5,"y":-2,"z":3,"color":[255,0,128]}"#).unwrap();
        assert_eq!(v, Voxel::new(1.5, -2.0, 3.0, [255, 0, 128]));
        assert_eq!(v.size, None);
    }

    #[test]
    fn test_deserialize_with_size() {
        let v: Voxel = serde_json::from_str(r#"{"x":0,"y":0,"z":0,"color":[1,2,3],"size":0.4}"#).unwrap();
        assert_eq!(v.size, Some(0.4));
    }

    #[test]
    fn test_color_normalized() {
        let v = Voxel::new(0.0, 0.0, 0.0, [255, 0, 51]);
        assert_eq!(v.color_normalized(), [1.0, 0.0, 0.2]);
    }
}
