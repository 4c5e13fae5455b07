//! Debug gizmos for tracked objects
//!
//! Draws the combined world bounds of every tracked object: green while the box
//! intersects the `LabelCamera` frustum, red when it is culled or disabled.

use bevy::prelude::*;

use crate::components::LabelCamera;
use crate::config::TrackedObjects;
use crate::geometry::CameraView;
use crate::geometry::WorldAabb;
use crate::geometry::WorldBounds;
use crate::support::GeometryQueries;
use crate::support::camera_snapshot;

/// Gizmo config group for tracked-object bounds.
/// Toggle via `GizmoConfigStore::config_mut::<LabelBoundsGizmo>().enabled`
#[derive(Default, Reflect, GizmoConfigGroup)]
pub struct LabelBoundsGizmo {}

/// Colors and line width for tracked-object bounds
#[derive(Resource, Reflect, Debug, Clone)]
#[reflect(Resource)]
pub struct LabelBoundsVisualizationConfig {
    pub visible_color: Color,
    pub culled_color:  Color,
    pub line_width:    f32,
}

impl Default for LabelBoundsVisualizationConfig {
    fn default() -> Self {
        Self {
            visible_color: Color::srgb(0.0, 1.0, 0.0), // Green
            culled_color:  Color::srgb(1.0, 0.0, 0.0), // Red
            line_width:    2.0,
        }
    }
}

/// Plugin that draws tracked-object bounds
pub struct LabelBoundsVisualizationPlugin;

impl Plugin for LabelBoundsVisualizationPlugin {
    fn build(&self, app: &mut App) {
        app.init_gizmo_group::<LabelBoundsGizmo>()
            .init_resource::<LabelBoundsVisualizationConfig>()
            .add_systems(Startup, init_label_bounds_gizmo)
            .add_systems(Update, draw_label_bounds);
    }
}

fn init_label_bounds_gizmo(
    mut config_store: ResMut<GizmoConfigStore>,
    viz_config: Res<LabelBoundsVisualizationConfig>,
) {
    let (config, _) = config_store.config_mut::<LabelBoundsGizmo>();
    // off by default so captured frames stay clean
    config.enabled = false;
    config.line.width = viz_config.line_width;
}

fn draw_label_bounds(
    mut gizmos: Gizmos<LabelBoundsGizmo>,
    config: Res<LabelBoundsVisualizationConfig>,
    tracked: Res<TrackedObjects>,
    camera_query: Query<(&Camera, &Projection, &GlobalTransform), With<LabelCamera>>,
    geometry: GeometryQueries,
) {
    let Ok((camera, projection, camera_transform)) = camera_query.single() else {
        return;
    };
    let Some(snapshot) = camera_snapshot(camera, projection, camera_transform) else {
        return;
    };

    for object in tracked.iter() {
        let object_geometry = geometry.object_geometry(object.entity);
        let Some(bounds) = object_geometry.world_bounds() else {
            continue;
        };

        let in_view =
            object_geometry.is_enabled() && snapshot.frustum().intersects_aabb(&bounds);
        let color = if in_view {
            config.visible_color
        } else {
            config.culled_color
        };
        draw_world_box(&mut gizmos, &bounds, color);
    }
}

/// Draws the 12 edges of a world-space box
fn draw_world_box(gizmos: &mut Gizmos<LabelBoundsGizmo>, bounds: &WorldAabb, color: Color) {
    const EDGES: [(usize, usize); 12] = [
        (0, 1),
        (2, 3),
        (4, 5),
        (6, 7),
        (0, 2),
        (1, 3),
        (4, 6),
        (5, 7),
        (0, 4),
        (1, 5),
        (2, 6),
        (3, 7),
    ];

    let corners = bounds.corners();
    for (start, end) in EDGES {
        gizmos.line(corners[start], corners[end], color);
    }
}
