//! Scene graph: CPU-side hierarchy of render content
//!
//! The graph always holds a root group with two persistent helpers (grid and
//! axes). Voxel batches and lights are swapped in wholesale from a
//! [`RenderPayload`]; every swap bumps the generation counter so the GPU side
//! knows to rebuild its buffers.

use std::collections::HashMap;

use glam::{Mat4, Quat, Vec3};

use crate::math::{Aabb, Ray};
use crate::render::batch::{Light, RenderPayload};

use super::flatten::{FlatLight, FlatScene, FlatVoxel};
use super::node::{LocalTransform, NodeContent, SceneNode, SceneNodeId, VoxelBatch};

/// Grid helper edge length
pub const GRID_SIZE: f32 = 10.0;
/// Grid helper cell count per side
pub const GRID_DIVISIONS: u32 = 20;
/// Axes helper line length
pub const AXES_SIZE: f32 = 2.0;

/// World-space distance within which a helper line counts as hit
pub const LINE_PICK_THRESHOLD: f32 = 1.0;

/// Root rotation aligning Z-up map data with the Y-up renderer.
pub fn map_alignment() -> Quat {
    Quat::from_rotation_x(-std::f32::consts::FRAC_PI_2)
}

/// A ray intersection with rendered content.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    pub node: SceneNodeId,
    /// Index of the hit instance, or of the line segment for helpers.
    pub instance: usize,
    /// World-space hit point.
    pub point: Vec3,
    /// Distance from the ray origin.
    pub distance: f32,
}

/// CPU-side scene graph.
pub struct SceneGraph {
    nodes: HashMap<SceneNodeId, SceneNode>,
    root: SceneNodeId,
    grid: SceneNodeId,
    axes: SceneNodeId,
    next_id: u64,
    generation: u64,
}

impl SceneGraph {
    /// Create a new scene graph with a root group, grid and axes.
    pub fn new() -> Self {
        let root_id = SceneNodeId(0);
        let root_node = SceneNode::new(root_id, "root", NodeContent::Group);

        let mut nodes = HashMap::new();
        nodes.insert(root_id, root_node);

        let mut graph = Self {
            nodes,
            root: root_id,
            grid: root_id,
            axes: root_id,
            next_id: 1,
            generation: 0,
        };

        graph.grid = graph.add_child(
            root_id,
            "grid",
            NodeContent::Grid { size: GRID_SIZE, divisions: GRID_DIVISIONS },
        );
        graph.axes = graph.add_child(root_id, "axes", NodeContent::Axes { size: AXES_SIZE });
        graph
    }

    /// Get the root node ID.
    pub fn root(&self) -> SceneNodeId {
        self.root
    }

    pub fn grid(&self) -> SceneNodeId {
        self.grid
    }

    pub fn axes(&self) -> SceneNodeId {
        self.axes
    }

    /// Incremented on every content change.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Allocate a fresh node ID.
    fn alloc_id(&mut self) -> SceneNodeId {
        let id = SceneNodeId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Add a child node under `parent`. Returns the new node's ID.
    pub fn add_child(
        &mut self,
        parent: SceneNodeId,
        name: impl Into<String>,
        content: NodeContent,
    ) -> SceneNodeId {
        let id = self.alloc_id();
        let mut node = SceneNode::new(id, name, content);
        node.parent = Some(parent);

        let parent_world = self
            .nodes
            .get(&parent)
            .map(|p| p.world_transform)
            .unwrap_or(Mat4::IDENTITY);
        node.world_transform = parent_world * node.local_transform.to_mat4();
        self.nodes.insert(id, node);

        // Register as child of parent
        if let Some(parent_node) = self.nodes.get_mut(&parent) {
            parent_node.children.push(id);
        }

        self.generation += 1;
        id
    }

    /// Remove a node and its entire subtree. Cannot remove the root.
    pub fn remove(&mut self, id: SceneNodeId) {
        if id == self.root {
            return;
        }

        // Collect subtree IDs (BFS)
        let mut to_remove = vec![id];
        let mut i = 0;
        while i < to_remove.len() {
            let current = to_remove[i];
            if let Some(node) = self.nodes.get(&current) {
                to_remove.extend_from_slice(&node.children);
            }
            i += 1;
        }

        // Detach from parent
        if let Some(parent_id) = self.nodes.get(&id).and_then(|n| n.parent) {
            if let Some(parent) = self.nodes.get_mut(&parent_id) {
                parent.children.retain(|c| *c != id);
            }
        }

        for nid in to_remove {
            self.nodes.remove(&nid);
        }

        self.generation += 1;
    }

    /// Set the local transform of a node and refresh world transforms below it.
    pub fn set_transform(&mut self, id: SceneNodeId, transform: LocalTransform) {
        let Some(node) = self.nodes.get_mut(&id) else {
            return;
        };
        node.local_transform = transform;
        let parent = node.parent;
        let parent_world = parent
            .and_then(|p| self.nodes.get(&p))
            .map(|p| p.world_transform)
            .unwrap_or(Mat4::IDENTITY);
        self.propagate_transforms(id, parent_world);
        self.generation += 1;
    }

    /// Get an immutable reference to a node.
    pub fn get(&self, id: SceneNodeId) -> Option<&SceneNode> {
        self.nodes.get(&id)
    }

    /// Iterate over the children of a node.
    pub fn children(&self, id: SceneNodeId) -> impl Iterator<Item = SceneNodeId> + '_ {
        self.nodes
            .get(&id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
            .iter()
            .copied()
    }

    /// Total number of nodes in the graph.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Remove everything except the grid and axes, then re-align the root.
    pub fn clear_except_base(&mut self) {
        let doomed: Vec<SceneNodeId> = self
            .children(self.root)
            .filter(|&c| c != self.grid && c != self.axes)
            .collect();
        for id in doomed {
            self.remove(id);
        }
        self.set_transform(self.root, LocalTransform::from_rotation(map_alignment()));
    }

    /// Replace all render content with `payload`.
    ///
    /// Lights are always added; the voxel node only when there are instances.
    pub fn apply_payload(&mut self, payload: RenderPayload) {
        self.clear_except_base();

        for (i, light) in payload.lights.into_iter().enumerate() {
            let id = self.add_child(self.root, format!("light-{i}"), NodeContent::Light(light));
            if let Light::Directional(dir) = light {
                self.set_transform(id, LocalTransform {
                    position: dir.position,
                    ..Default::default()
                });
            }
        }

        if !payload.instances.is_empty() {
            self.add_child(
                self.root,
                "voxels",
                NodeContent::Voxels(VoxelBatch {
                    box_edge: payload.box_edge,
                    instances: payload.instances,
                    material: payload.material,
                    bounds: payload.bounds,
                }),
            );
        }

        log::debug!("Scene rebuilt: {} nodes, generation {}", self.nodes.len(), self.generation);
    }

    /// Recursively propagate world transforms.
    fn propagate_transforms(&mut self, node_id: SceneNodeId, parent_world: Mat4) {
        let (local_mat, children) = {
            let node = match self.nodes.get(&node_id) {
                Some(n) => n,
                None => return,
            };
            (node.local_transform.to_mat4(), node.children.clone())
        };

        let world = parent_world * local_mat;

        if let Some(node) = self.nodes.get_mut(&node_id) {
            node.world_transform = world;
        }

        for child_id in children {
            self.propagate_transforms(child_id, world);
        }
    }

    /// Walk the tree and collect all render content, in world space.
    pub fn flatten(&self) -> FlatScene {
        let mut out = FlatScene::default();
        self.collect_content(self.root, &mut out);
        out
    }

    /// Recursively collect render content.
    fn collect_content(&self, node_id: SceneNodeId, out: &mut FlatScene) {
        let node = match self.nodes.get(&node_id) {
            Some(n) => n,
            None => return,
        };

        let world = node.world_transform;
        match &node.content {
            NodeContent::Group => {}
            NodeContent::Grid { size, divisions } => out.push_grid(&world, *size, *divisions),
            NodeContent::Axes { size } => out.push_axes(&world, *size),
            NodeContent::Voxels(batch) => {
                let unit = Mat4::from_scale(Vec3::splat(batch.box_edge));
                out.voxels.extend(batch.instances.iter().map(|inst| FlatVoxel {
                    model: world * inst.transform * unit,
                    color: inst.color,
                }));
                out.material = Some(batch.material);
                out.voxel_bounds = out.voxel_bounds.merged(&batch.bounds.transformed(&world));
            }
            NodeContent::Light(light) => out.lights.push(FlatLight::from_light(light, &world)),
        }

        for &child_id in &node.children {
            self.collect_content(child_id, out);
        }
    }

    /// All intersections with rendered content along `ray`, nearest first.
    ///
    /// Voxel boxes are hit on their surface; grid and axes lines are hit when
    /// the ray passes within [`LINE_PICK_THRESHOLD`] of a segment, at the
    /// closest point on that segment.
    pub fn raycast(&self, ray: &Ray) -> Vec<RayHit> {
        let mut hits = Vec::new();
        self.raycast_node(self.root, ray, &mut hits);
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }

    fn raycast_node(&self, node_id: SceneNodeId, ray: &Ray, hits: &mut Vec<RayHit>) {
        let Some(node) = self.nodes.get(&node_id) else {
            return;
        };
        match &node.content {
            NodeContent::Voxels(batch) => Self::raycast_batch(node, batch, ray, hits),
            NodeContent::Grid { size, divisions } => {
                let mut lines = FlatScene::default();
                lines.push_grid(&node.world_transform, *size, *divisions);
                Self::raycast_lines(node.id, &lines, ray, hits);
            }
            NodeContent::Axes { size } => {
                let mut lines = FlatScene::default();
                lines.push_axes(&node.world_transform, *size);
                Self::raycast_lines(node.id, &lines, ray, hits);
            }
            NodeContent::Group | NodeContent::Light(_) => {}
        }

        for &child_id in &node.children {
            self.raycast_node(child_id, ray, hits);
        }
    }

    fn raycast_lines(node: SceneNodeId, lines: &FlatScene, ray: &Ray, hits: &mut Vec<RayHit>) {
        let threshold_sq = LINE_PICK_THRESHOLD * LINE_PICK_THRESHOLD;
        for (index, segment) in lines.lines.chunks_exact(2).enumerate() {
            let start = Vec3::from_array(segment[0].position);
            let end = Vec3::from_array(segment[1].position);
            let (dist_sq, _, point) = ray.closest_to_segment(start, end);
            if dist_sq > threshold_sq {
                continue;
            }
            hits.push(RayHit {
                node,
                instance: index,
                point,
                distance: point.distance(ray.origin),
            });
        }
    }

    fn raycast_batch(node: &SceneNode, batch: &VoxelBatch, ray: &Ray, hits: &mut Vec<RayHit>) {
        let world = node.world_transform;
        let local_ray = ray.transform(&world.inverse());
        if local_ray.intersects_aabb(&batch.bounds).is_none() {
            return;
        }

        let half = Vec3::splat(batch.box_edge * 0.5);
        let unit_box = Aabb::new(-half, half);
        for (index, inst) in batch.instances.iter().enumerate() {
            let aabb = unit_box.transformed(&inst.transform);
            if let Some((t_near, _)) = local_ray.intersects_aabb(&aabb) {
                let point = world.transform_point3(local_ray.at(t_near));
                hits.push(RayHit {
                    node: node.id,
                    instance: index,
                    point,
                    distance: point.distance(ray.origin),
                });
            }
        }
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::batch::{InstanceBatcher, RenderMode};
    use crate::voxel::{Voxel, VoxelMap};

    fn payload(voxels: Vec<Voxel>, mode: RenderMode) -> RenderPayload {
        let map = VoxelMap::new(voxels, 1.0).unwrap();
        InstanceBatcher::build(&map.deselect(), mode)
    }

    fn voxel_nodes(graph: &SceneGraph) -> usize {
        graph
            .children(graph.root())
            .filter(|&c| matches!(graph.get(c).map(|n| &n.content), Some(NodeContent::Voxels(_))))
            .count()
    }

    #[test]
    fn test_new_scene_graph_has_helpers() {
        let graph = SceneGraph::new();
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.get(graph.root()).unwrap().name, "root");
        assert!(graph.children(graph.root()).any(|c| c == graph.grid()));
        assert!(graph.children(graph.root()).any(|c| c == graph.axes()));
    }

    #[test]
    fn test_remove_subtree() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let parent = graph.add_child(root, "parent", NodeContent::Group);
        let child = graph.add_child(parent, "child", NodeContent::Group);
        graph.remove(parent);
        assert!(graph.get(parent).is_none());
        assert!(graph.get(child).is_none());
        assert_eq!(graph.node_count(), 3);
    }

    #[test]
    fn test_cannot_remove_root() {
        let mut graph = SceneGraph::new();
        graph.remove(graph.root());
        assert!(graph.get(graph.root()).is_some());
    }

    #[test]
    fn test_clear_keeps_helpers_and_rotates_root() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        graph.add_child(root, "stray", NodeContent::Group);
        graph.clear_except_base();

        assert_eq!(graph.node_count(), 3);
        let rotation = graph.get(root).unwrap().local_transform.rotation;
        assert!(rotation.dot(map_alignment()).abs() > 1.0 - 1e-6);
    }

    #[test]
    fn test_apply_payload_is_rebuild_not_patch() {
        let mut graph = SceneGraph::new();
        let voxels = vec![Voxel::new(0.0, 0.0, 0.0, [1, 2, 3]), Voxel::new(2.0, 0.0, 0.0, [1, 2, 3])];

        graph.apply_payload(payload(voxels.clone(), RenderMode::Shaded));
        let after_first = graph.node_count();
        graph.apply_payload(payload(voxels, RenderMode::Shaded));

        // root + grid + axes + 3 lights + voxels
        assert_eq!(after_first, 7);
        assert_eq!(graph.node_count(), 7);
        assert_eq!(voxel_nodes(&graph), 1);
        assert_eq!(graph.flatten().lights.len(), 3);
    }

    #[test]
    fn test_raw_payload_drops_lights() {
        let mut graph = SceneGraph::new();
        let voxels = vec![Voxel::new(0.0, 0.0, 0.0, [1, 2, 3])];
        graph.apply_payload(payload(voxels.clone(), RenderMode::Shaded));
        graph.apply_payload(payload(voxels, RenderMode::Raw));
        assert!(graph.flatten().lights.is_empty());
        assert_eq!(graph.node_count(), 4);
    }

    #[test]
    fn test_empty_payload_clears_and_rotates() {
        let mut graph = SceneGraph::new();
        graph.apply_payload(payload(vec![Voxel::new(0.0, 0.0, 0.0, [0, 0, 0])], RenderMode::Raw));
        let generation = graph.generation();

        graph.apply_payload(payload(Vec::new(), RenderMode::Raw));
        assert_eq!(voxel_nodes(&graph), 0);
        assert!(graph.generation() > generation);
        let rotation = graph.get(graph.root()).unwrap().local_transform.rotation;
        assert!(rotation.dot(map_alignment()).abs() > 1.0 - 1e-6);
    }

    #[test]
    fn test_flatten_applies_root_rotation() {
        let mut graph = SceneGraph::new();
        graph.apply_payload(payload(vec![Voxel::new(0.0, 0.0, 3.0, [0, 0, 0])], RenderMode::Raw));
        let flat = graph.flatten();
        assert_eq!(flat.voxels.len(), 1);
        let center = flat.voxels[0].model.transform_point3(Vec3::ZERO);
        // Map Z-up becomes render Y-up
        assert!((center - Vec3::new(0.0, 3.0, 0.0)).length() < 1e-5);
        assert!(!flat.lines.is_empty());
    }

    #[test]
    fn test_raycast_nearest_first() {
        let mut graph = SceneGraph::new();
        // Map y = -3 puts both voxels at render z = 3, clear of the grid plane
        let voxels = vec![
            Voxel::new(0.0, -3.0, 0.0, [0, 0, 0]),
            Voxel::new(0.0, -3.0, 4.0, [0, 0, 0]),
        ];
        graph.apply_payload(payload(voxels, RenderMode::Raw));

        // After alignment the voxels sit at y = 0 and y = 4; shoot straight down.
        let ray = Ray::new(Vec3::new(0.0, 10.0, 3.0), -Vec3::Y);
        let hits = graph.raycast(&ray);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].instance, 1);
        assert!((hits[0].point - Vec3::new(0.0, 4.5, 3.0)).length() < 1e-4);
        assert!(hits[0].distance < hits[1].distance);
    }

    #[test]
    fn test_raycast_hits_grid_lines() {
        let mut graph = SceneGraph::new();
        graph.clear_except_base();
        // The aligned grid lies in the render z = 0 plane
        let ray = Ray::new(Vec3::new(0.5, 1.0, 10.0), -Vec3::Z);
        let hits = graph.raycast(&ray);

        // Lines x = 0.5 and y = 1 cross right under the ray
        assert_eq!(hits[0].node, graph.grid());
        assert!((hits[0].point - Vec3::new(0.5, 1.0, 0.0)).length() < 1e-4);
        assert!((hits[0].distance - 10.0).abs() < 1e-4);
        for hit in &hits {
            let (x, y) = (hit.point.x - 0.5, hit.point.y - 1.0);
            assert!(x * x + y * y <= LINE_PICK_THRESHOLD * LINE_PICK_THRESHOLD + 1e-4);
        }
    }

    #[test]
    fn test_raycast_hits_axes() {
        let mut graph = SceneGraph::new();
        graph.clear_except_base();
        let grid = graph.grid();
        graph.remove(grid);
        // Render X axis runs from the origin to (2, 0, 0)
        let ray = Ray::new(Vec3::new(1.5, 0.5, 10.0), -Vec3::Z);
        let hits = graph.raycast(&ray);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].node, graph.axes());
        assert!((hits[0].point - Vec3::new(1.5, 0.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn test_raycast_misses_far_from_helpers() {
        let graph = SceneGraph::new();
        let ray = Ray::new(Vec3::new(20.0, 20.0, 10.0), -Vec3::Z);
        assert!(graph.raycast(&ray).is_empty());
    }
}
