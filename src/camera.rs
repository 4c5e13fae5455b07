//! Per-capture camera snapshot: viewport, clip-from-world transform and frustum planes.

use bevy::prelude::*;

use crate::geometry::CameraView;
use crate::geometry::WorldAabb;

/// Homogeneous `w` below this magnitude cannot be divided through
const MIN_CLIP_W: f32 = 1e-6;

/// Six world-space half-spaces `(normal, d)`; a point `p` is inside a plane when
/// `normal.dot(p) + d >= 0`.
///
/// Order: left, right, bottom, top, near, far.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrustumPlanes {
    pub planes: [Vec4; 6],
}

impl FrustumPlanes {
    /// Extracts the planes from a clip-from-world matrix (rows combined per clip axis).
    ///
    /// Bevy projections use reversed depth (`0 <= z_clip <= w_clip`), so the near plane is
    /// `w - z` and the far plane is `z`. With an infinite far plane the far row has a zero
    /// normal and a positive distance, which never rejects anything.
    pub fn from_clip_from_world(clip_from_world: &Mat4) -> Self {
        let row_x = clip_from_world.row(0);
        let row_y = clip_from_world.row(1);
        let row_z = clip_from_world.row(2);
        let row_w = clip_from_world.row(3);

        Self {
            planes: [
                row_w + row_x,
                row_w - row_x,
                row_w + row_y,
                row_w - row_y,
                row_w - row_z,
                row_z,
            ],
        }
    }

    /// Returns false when the box lies entirely on the outer side of any plane.
    pub fn intersects_aabb(&self, aabb: &WorldAabb) -> bool {
        self.planes.iter().all(|plane| {
            let normal = plane.truncate();
            // corner furthest along the plane normal
            let positive = Vec3::select(normal.cmpge(Vec3::ZERO), aabb.max, aabb.min);
            normal.dot(positive) + plane.w >= 0.0
        })
    }
}

/// Camera state read once per capture so every object in that capture is measured
/// against the same view.
#[derive(Debug, Clone, Copy)]
pub struct CameraSnapshot {
    viewport:        UVec2,
    clip_from_world: Mat4,
    frustum:         FrustumPlanes,
}

impl CameraSnapshot {
    pub fn new(clip_from_world: Mat4, viewport: UVec2) -> Self {
        Self {
            viewport,
            clip_from_world,
            frustum: FrustumPlanes::from_clip_from_world(&clip_from_world),
        }
    }

    /// Builds a snapshot from a camera's projection matrix and its world transform.
    pub fn from_camera(
        clip_from_view: Mat4,
        camera_transform: &GlobalTransform,
        viewport: UVec2,
    ) -> Self {
        let view_from_world = Mat4::from(camera_transform.affine().inverse());
        Self::new(clip_from_view * view_from_world, viewport)
    }
}

impl CameraView for CameraSnapshot {
    fn viewport_size(&self) -> UVec2 { self.viewport }

    fn world_to_screen(&self, world: Vec3) -> Option<Vec2> {
        let clip = self.clip_from_world * world.extend(1.0);
        if clip.w.abs() < MIN_CLIP_W {
            return None;
        }

        // No clipping: points behind the camera divide through a negative `w`
        let ndc = clip.truncate() / clip.w;
        let size = self.viewport.as_vec2();
        let screen = Vec2::new(
            (ndc.x + 1.0) * 0.5 * size.x,
            (1.0 - ndc.y) * 0.5 * size.y,
        );

        screen.is_finite().then_some(screen)
    }

    fn frustum(&self) -> &FrustumPlanes { &self.frustum }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    const VIEWPORT: UVec2 = UVec2::new(640, 480);

    /// Camera at `(0, 0, 5)` looking down `-Z` with a 90 degree vertical field of view
    fn snapshot() -> CameraSnapshot {
        let transform = GlobalTransform::from(
            Transform::from_xyz(0.0, 0.0, 5.0).looking_at(Vec3::ZERO, Vec3::Y),
        );
        let projection = Mat4::perspective_infinite_reverse_rh(
            std::f32::consts::FRAC_PI_2,
            VIEWPORT.x as f32 / VIEWPORT.y as f32,
            0.1,
        );
        CameraSnapshot::from_camera(projection, &transform, VIEWPORT)
    }

    fn unit_box_at(center: Vec3) -> WorldAabb {
        WorldAabb::new(center - Vec3::splat(0.5), center + Vec3::splat(0.5))
    }

    #[test]
    fn look_target_projects_to_viewport_center() {
        let screen = snapshot().world_to_screen(Vec3::ZERO).expect("in front of camera");
        assert_relative_eq!(screen.x, 320.0, epsilon = 1e-3);
        assert_relative_eq!(screen.y, 240.0, epsilon = 1e-3);
    }

    #[test]
    fn screen_y_grows_downward() {
        let camera = snapshot();
        let above = camera.world_to_screen(Vec3::Y).expect("projectable");
        let below = camera.world_to_screen(-Vec3::Y).expect("projectable");
        let right = camera.world_to_screen(Vec3::X).expect("projectable");

        assert!(above.y < 240.0);
        assert!(below.y > 240.0);
        assert!(right.x > 320.0);
        // tan(45deg) = 1, so one unit up at distance 5 is a fifth of the half height
        assert_relative_eq!(above.y, 240.0 - 240.0 / 5.0, epsilon = 1e-3);
    }

    #[test]
    fn point_in_camera_plane_is_not_projectable() {
        assert!(snapshot().world_to_screen(Vec3::new(1.0, 0.0, 5.0)).is_none());
    }

    #[test]
    fn frustum_accepts_box_in_view() {
        let camera = snapshot();
        assert!(camera.frustum().intersects_aabb(&unit_box_at(Vec3::ZERO)));
    }

    #[test]
    fn frustum_accepts_box_straddling_an_edge() {
        // at distance 5 the half width is 5 * aspect
        let edge_x = 5.0 * VIEWPORT.x as f32 / VIEWPORT.y as f32;
        let camera = snapshot();
        assert!(
            camera
                .frustum()
                .intersects_aabb(&unit_box_at(Vec3::new(edge_x + 0.25, 0.0, 0.0)))
        );
    }

    #[test]
    fn frustum_rejects_boxes_outside_any_plane() {
        let camera = snapshot();
        let frustum = camera.frustum();

        assert!(!frustum.intersects_aabb(&unit_box_at(Vec3::new(0.0, 0.0, 20.0))));
        assert!(!frustum.intersects_aabb(&unit_box_at(Vec3::new(-50.0, 0.0, 0.0))));
        assert!(!frustum.intersects_aabb(&unit_box_at(Vec3::new(50.0, 0.0, 0.0))));
        assert!(!frustum.intersects_aabb(&unit_box_at(Vec3::new(0.0, 50.0, 0.0))));
        assert!(!frustum.intersects_aabb(&unit_box_at(Vec3::new(0.0, -50.0, 0.0))));
    }

    #[test]
    fn infinite_far_plane_never_rejects() {
        let camera = snapshot();
        assert!(
            camera
                .frustum()
                .intersects_aabb(&unit_box_at(Vec3::new(0.0, 0.0, -10_000.0)))
        );
    }
}
