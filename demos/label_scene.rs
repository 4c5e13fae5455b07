//! Captures a labeled object-detection dataset from a small scene using
//! `bevy_dataset_label`.
//!
//! - Press 'Space' to capture the current view
//! - Press 'T' to toggle timed capture (every 0.5 s)
//! - Middle-drag to orbit the camera
//! - Press 'D' to toggle the tracked-object bounds gizmo
//!
//! Images and labels are written under `dataset/`.

use std::f32::consts::PI;

use bevy::color::palettes::basic::SILVER;
use bevy::prelude::*;
use bevy::render::view::screenshot::Screenshot;
use bevy::render::view::screenshot::ScreenshotCaptured;
use bevy_brp_extras::BrpExtrasPlugin;
use bevy_dataset_label::LabelBoundsGizmo;
use bevy_dataset_label::LabelBoundsVisualizationPlugin;
use bevy_dataset_label::prelude::*;
use bevy_panorbit_camera::PanOrbitCamera;
use bevy_panorbit_camera::PanOrbitCameraPlugin;

const TIMER_DELAY_SECS: f32 = 0.5;
const MESH_CENTER_Y: f32 = 1.0;

const CLASS_CUBE: u32 = 0;
const CLASS_SPHERE: u32 = 1;
const CLASS_TORUS: u32 = 2;
const CLASS_LAMP: u32 = 3;

fn main() {
    App::new()
        .add_plugins((
            DefaultPlugins,
            PanOrbitCameraPlugin,
            DatasetLabelPlugin,
            LabelBoundsVisualizationPlugin,
            BrpExtrasPlugin::default(),
        ))
        .insert_resource(CaptureTrigger {
            delay_secs: TIMER_DELAY_SECS,
            ..default()
        })
        .add_systems(Startup, setup)
        .add_systems(Update, (toggle_timer, toggle_bounds_gizmo))
        .add_observer(request_window_frame)
        .add_observer(log_capture)
        .run();
}

fn setup(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    // Ground plane (not labeled)
    commands.spawn((
        Mesh3d(meshes.add(Plane3d::default().mesh().size(50.0, 50.0))),
        MeshMaterial3d(materials.add(Color::from(SILVER))),
    ));

    commands.spawn((
        DirectionalLight {
            illuminance: 1500.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_rotation(Quat::from_euler(EulerRot::ZYX, 0.0, PI / 4.0, -PI / 4.0)),
    ));

    commands.spawn((
        Mesh3d(meshes.add(Cuboid::new(1.0, 1.0, 1.0))),
        MeshMaterial3d(materials.add(Color::srgb(0.5, 0.5, 0.9))),
        Transform::from_xyz(-2.5, MESH_CENTER_Y, 0.0),
        LabelTarget::new(CLASS_CUBE),
    ));

    commands.spawn((
        Mesh3d(meshes.add(Sphere::new(0.5))),
        MeshMaterial3d(materials.add(Color::srgb(0.9, 0.3, 0.2))),
        Transform::from_xyz(0.0, MESH_CENTER_Y, 0.0),
        LabelTarget::new(CLASS_SPHERE),
    ));

    commands.spawn((
        Mesh3d(meshes.add(Torus::new(0.25, 0.75))),
        MeshMaterial3d(materials.add(Color::srgb(0.3, 0.8, 0.4))),
        Transform::from_xyz(2.5, MESH_CENTER_Y, 0.0),
        LabelTarget::new(CLASS_TORUS),
    ));

    // Compound object: the label box covers the post and its shade
    commands
        .spawn((
            Mesh3d(meshes.add(Cylinder::new(0.08, 1.6))),
            MeshMaterial3d(materials.add(Color::srgb(0.2, 0.2, 0.2))),
            Transform::from_xyz(0.0, 0.8, -2.5),
            LabelTarget::new(CLASS_LAMP),
        ))
        .with_child((
            Mesh3d(meshes.add(Cone::new(0.5, 0.5))),
            MeshMaterial3d(materials.add(Color::srgb(0.95, 0.85, 0.4))),
            Transform::from_xyz(0.0, 0.9, 0.0),
        ));

    commands.spawn((
        PanOrbitCamera {
            button_orbit: MouseButton::Middle,
            button_pan: MouseButton::Middle,
            modifier_pan: Some(KeyCode::ShiftLeft),
            radius: Some(8.0),
            pitch: Some(0.3),
            ..default()
        },
        LabelCamera,
    ));

    commands.spawn((
        Text::new("Space: capture | T: timed capture | D: bounds"),
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(12.0),
            left: Val::Px(12.0),
            ..default()
        },
    ));
}

/// Screenshots the window for a measured capture. The screenshot is rendered from the
/// frame that triggered the request, and is stored under its id when the readback lands.
fn request_window_frame(request: On<CaptureFrameRequested>, mut commands: Commands) {
    let request_id = request.request_id;
    commands.spawn(Screenshot::primary_window()).observe(
        move |captured: On<ScreenshotCaptured>, mut frames: ResMut<RenderedFrames>| {
            let Ok(image) = captured.image.clone().try_into_dynamic() else {
                warn!("Screenshot has an unsupported texture format");
                return;
            };
            let rgb = image.to_rgb8();
            let (width, height) = (rgb.width(), rgb.height());
            match Frame::from_rgb(width, height, rgb.into_raw()) {
                Ok(frame) => frames.store(request_id, frame),
                Err(error) => warn!("Discarding screenshot: {error}"),
            }
        },
    );
}

fn toggle_timer(keyboard: Res<ButtonInput<KeyCode>>, mut trigger: ResMut<CaptureTrigger>) {
    if keyboard.just_pressed(KeyCode::KeyT) {
        trigger.timer_enabled = !trigger.timer_enabled;
        info!("Timed capture: {}", trigger.timer_enabled);
    }
}

fn toggle_bounds_gizmo(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut config_store: ResMut<GizmoConfigStore>,
) {
    if keyboard.just_pressed(KeyCode::KeyD) {
        let (config, _) = config_store.config_mut::<LabelBoundsGizmo>();
        config.enabled = !config.enabled;
    }
}

fn log_capture(capture: On<CaptureComplete>) {
    for label in &capture.labels {
        info!("image {}: {label}", capture.image_index);
    }
}
