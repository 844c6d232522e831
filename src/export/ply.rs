//! PLY document builders for voxel views

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use ply_rs::{
    ply::{Addable, DefaultElement, ElementDef, Ply, Property, PropertyDef, PropertyType, ScalarType},
    writer::Writer,
};

use crate::core::types::Result;
use crate::voxel::{Voxel, VoxelView};

/// Cube faces as corner indices, counter-clockwise seen from outside
const CUBE_FACES: [[i32; 4]; 6] = [
    [3, 2, 1, 0],
    [4, 5, 6, 7],
    [0, 1, 5, 4],
    [2, 3, 7, 6],
    [3, 0, 4, 7],
    [1, 2, 6, 5],
];

fn colored_vertex_def(count: usize) -> ElementDef {
    let mut vertex = ElementDef::new("vertex".to_string());
    vertex.count = count;
    for name in ["x", "y", "z"] {
        vertex.properties.add(PropertyDef::new(
            name.to_string(),
            PropertyType::Scalar(ScalarType::Float),
        ));
    }
    for name in ["red", "green", "blue"] {
        vertex.properties.add(PropertyDef::new(
            name.to_string(),
            PropertyType::Scalar(ScalarType::UChar),
        ));
    }
    vertex
}

fn colored_vertex(x: f32, y: f32, z: f32, color: [u8; 3]) -> DefaultElement {
    let mut vertex = DefaultElement::new();
    vertex.insert("x".to_string(), Property::Float(x));
    vertex.insert("y".to_string(), Property::Float(y));
    vertex.insert("z".to_string(), Property::Float(z));
    vertex.insert("red".to_string(), Property::UChar(color[0]));
    vertex.insert("green".to_string(), Property::UChar(color[1]));
    vertex.insert("blue".to_string(), Property::UChar(color[2]));
    vertex
}

/// The eight corners of a voxel cube with edge `edge`
fn cube_corners(voxel: &Voxel, edge: f32) -> [[f32; 3]; 8] {
    let h = edge / 2.0;
    let (x, y, z) = (voxel.x, voxel.y, voxel.z);
    [
        [x - h, y - h, z - h],
        [x + h, y - h, z - h],
        [x + h, y + h, z - h],
        [x - h, y + h, z - h],
        [x - h, y - h, z + h],
        [x + h, y - h, z + h],
        [x + h, y + h, z + h],
        [x - h, y + h, z + h],
    ]
}

/// One coloured cube mesh per voxel: 8 vertices and 6 quads each
///
/// Cube edge is the voxel size, or the resolution when the voxel has none.
pub fn voxel_mesh_ply(view: &VoxelView<'_>) -> Ply<DefaultElement> {
    let voxels = view.voxels();
    let mut ply = Ply::<DefaultElement>::new();

    ply.header.elements.add(colored_vertex_def(voxels.len() * 8));
    let mut face_def = ElementDef::new("face".to_string());
    face_def.count = voxels.len() * CUBE_FACES.len();
    face_def.properties.add(PropertyDef::new(
        "vertex_indices".to_string(),
        PropertyType::List(ScalarType::UChar, ScalarType::Int),
    ));
    ply.header.elements.add(face_def);

    let mut vertices = Vec::with_capacity(voxels.len() * 8);
    let mut faces = Vec::with_capacity(voxels.len() * CUBE_FACES.len());
    for (i, voxel) in voxels.iter().enumerate() {
        let edge = voxel.size.unwrap_or(view.resolution());
        for [x, y, z] in cube_corners(voxel, edge) {
            vertices.push(colored_vertex(x, y, z, voxel.color));
        }

        let offset = (i * 8) as i32;
        for face in CUBE_FACES {
            let mut element = DefaultElement::new();
            element.insert(
                "vertex_indices".to_string(),
                Property::ListInt(face.iter().map(|c| c + offset).collect()),
            );
            faces.push(element);
        }
    }

    ply.payload.insert("vertex".to_string(), vertices);
    ply.payload.insert("face".to_string(), faces);
    ply
}

/// One coloured vertex per voxel centre
pub fn point_cloud_ply(view: &VoxelView<'_>) -> Ply<DefaultElement> {
    let voxels = view.voxels();
    let mut ply = Ply::<DefaultElement>::new();
    ply.header.elements.add(colored_vertex_def(voxels.len()));

    let vertices = voxels
        .iter()
        .map(|v| colored_vertex(v.x, v.y, v.z, v.color))
        .collect();
    ply.payload.insert("vertex".to_string(), vertices);
    ply
}

/// Write an ASCII PLY document to `path`
pub fn write_ply(ply: &mut Ply<DefaultElement>, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    Writer::new().write_ply(&mut writer, ply)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voxel::VoxelMap;

    fn view_map() -> VoxelMap {
        VoxelMap::new(
            vec![
                Voxel::new(0.0, 0.0, 0.0, [255, 0, 0]),
                Voxel::new(1.0, 2.0, 3.0, [0, 255, 0]).with_size(2.0),
            ],
            0.5,
        )
        .unwrap()
    }

    #[test]
    fn test_mesh_counts_and_indices() {
        let map = view_map();
        let ply = voxel_mesh_ply(&map.deselect());

        assert_eq!(ply.payload["vertex"].len(), 16);
        assert_eq!(ply.payload["face"].len(), 12);
        assert_eq!(ply.header.elements["vertex"].count, 16);

        // Second voxel's first face is offset by 8
        match ply.payload["face"][6].get("vertex_indices") {
            Some(Property::ListInt(indices)) => assert_eq!(indices, &vec![11, 10, 9, 8]),
            other => panic!("unexpected face property: {other:?}"),
        }
    }

    #[test]
    fn test_mesh_edge_uses_size_or_resolution() {
        let map = view_map();
        let ply = voxel_mesh_ply(&map.deselect());
        let vertices = &ply.payload["vertex"];

        // Default edge is the resolution (0.5)
        assert_eq!(vertices[0].get("x"), Some(&Property::Float(-0.25)));
        // Explicit size 2.0 around (1, 2, 3)
        assert_eq!(vertices[8].get("x"), Some(&Property::Float(0.0)));
        assert_eq!(vertices[14].get("z"), Some(&Property::Float(4.0)));
        assert_eq!(vertices[14].get("green"), Some(&Property::UChar(255)));
    }

    #[test]
    fn test_point_cloud() {
        let map = view_map();
        let ply = point_cloud_ply(&map.deselect());
        let vertices = &ply.payload["vertex"];
        assert_eq!(vertices.len(), 2);
        assert_eq!(vertices[1].get("y"), Some(&Property::Float(2.0)));
        assert_eq!(vertices[0].get("red"), Some(&Property::UChar(255)));
        assert!(!ply.header.elements.contains_key("face"));
    }
}
