//! Adapter from ECS entities and mesh assets to the labeling core's geometry traits.

use bevy::camera::CameraProjection;
use bevy::camera::primitives::Aabb;
use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

use crate::camera::CameraSnapshot;
use crate::geometry::MeshPart;
use crate::geometry::ObjectGeometry;

/// Read access to everything needed to build an [`ObjectGeometry`] for an entity.
#[derive(SystemParam)]
pub struct GeometryQueries<'w, 's> {
    children:   Query<'w, 's, &'static Children>,
    visibility: Query<'w, 's, &'static Visibility>,
    parts:      Query<
        'w,
        's,
        (
            &'static Mesh3d,
            &'static GlobalTransform,
            Option<&'static Aabb>,
        ),
    >,
    meshes:     Res<'w, Assets<Mesh>>,
}

impl GeometryQueries<'_, '_> {
    /// Collects the mesh parts of an entity and its descendants, root first, depth first.
    ///
    /// The object is disabled when the root's own `Visibility` is `Hidden`. A hidden
    /// descendant is left out together with its whole subtree. Parts whose mesh asset is
    /// not loaded keep their transform but carry no vertex data.
    pub fn object_geometry(&self, entity: Entity) -> ObjectGeometry<'_> {
        let enabled = !self.is_hidden(entity);

        let mut parts = Vec::new();
        self.collect_parts(entity, &mut parts);

        ObjectGeometry::new(enabled, parts)
    }

    fn is_hidden(&self, entity: Entity) -> bool {
        matches!(self.visibility.get(entity), Ok(Visibility::Hidden))
    }

    fn collect_parts<'a>(&'a self, entity: Entity, parts: &mut Vec<MeshPart<'a>>) {
        if let Ok((mesh3d, global_transform, aabb)) = self.parts.get(entity) {
            parts.push(self.mesh_part(entity, mesh3d, global_transform, aabb));
        }

        let Ok(children) = self.children.get(entity) else {
            return;
        };
        let children: &[Entity] = children;
        for &child in children {
            if self.is_hidden(child) {
                continue;
            }
            self.collect_parts(child, parts);
        }
    }

    fn mesh_part(
        &self,
        part_entity: Entity,
        mesh3d: &Mesh3d,
        global_transform: &GlobalTransform,
        aabb: Option<&Aabb>,
    ) -> MeshPart<'_> {
        let vertices = self
            .meshes
            .get(&mesh3d.0)
            .and_then(|mesh| mesh.attribute(Mesh::ATTRIBUTE_POSITION))
            .and_then(|positions| positions.as_float3());

        let local_to_world = global_transform.affine();
        match (vertices, aabb) {
            (vertices, Some(aabb)) => MeshPart {
                vertices,
                local_bounds: Some((Vec3::from(aabb.center), Vec3::from(aabb.half_extents))),
                local_to_world,
            },
            // `Aabb` is computed in `PostUpdate`, so a freshly spawned mesh has none yet
            (Some(vertices), None) => MeshPart::from_vertices(vertices, local_to_world),
            (None, None) => {
                debug!("Mesh on {part_entity:?} is not loaded or has no positions");
                MeshPart::empty(local_to_world)
            },
        }
    }
}

/// Snapshot of a camera's current view, `None` until its viewport size is known.
///
/// The projection matrix is rebuilt from `Projection` for the current viewport, so it does
/// not depend on the render world having updated the camera yet.
pub fn camera_snapshot(
    camera: &Camera,
    projection: &Projection,
    camera_transform: &GlobalTransform,
) -> Option<CameraSnapshot> {
    let viewport = camera.physical_viewport_size()?;
    if viewport.x == 0 || viewport.y == 0 {
        return None;
    }

    let logical = camera
        .logical_viewport_size()
        .unwrap_or_else(|| viewport.as_vec2());
    let mut projection = projection.clone();
    projection.update(logical.x, logical.y);

    Some(CameraSnapshot::from_camera(
        projection.get_clip_from_view(),
        camera_transform,
        viewport,
    ))
}
