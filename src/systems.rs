//! Systems and observers that drive captures from the ECS.

use bevy::prelude::*;

use crate::capture::CaptureObject;
use crate::capture::CapturePlan;
use crate::capture::CaptureSession;
use crate::capture::PendingCaptures;
use crate::components::LabelCamera;
use crate::components::LabelTarget;
use crate::config::LabelConfig;
use crate::config::TrackedObjects;
use crate::dataset::DatasetDirectory;
use crate::events::CaptureComplete;
use crate::events::CaptureFrameRequested;
use crate::events::RequestCapture;
use crate::frame::RenderedFrames;
use crate::support::GeometryQueries;
use crate::support::camera_snapshot;
use crate::trigger::CaptureTrigger;

/// Creates the dataset directories and starts the session at the configured index.
pub fn prepare_dataset(
    mut commands: Commands,
    config: Res<LabelConfig>,
    mut session: ResMut<CaptureSession>,
) {
    *session = CaptureSession::new(config.start_index);

    match DatasetDirectory::open(&config.dataset_root) {
        Ok(dataset) => {
            info!(
                "Dataset ready at {} (first index {})",
                config.dataset_root.display(),
                config.start_index
            );
            commands.insert_resource(dataset);
        },
        Err(error) => error!("Dataset unavailable, captures are disabled: {error}"),
    }
}

/// Arms a manual capture when the configured key is pressed.
pub fn request_capture_on_key(
    config: Res<LabelConfig>,
    keys: Option<Res<ButtonInput<KeyCode>>>,
    mut trigger: ResMut<CaptureTrigger>,
) {
    let (Some(key), Some(keys)) = (config.capture_key, keys) else {
        return;
    };
    if keys.just_pressed(key) {
        trigger.request();
    }
}

/// Observer for `RequestCapture` - arms a manual capture for the next step
pub fn on_request_capture(_request: On<RequestCapture>, mut trigger: ResMut<CaptureTrigger>) {
    trigger.request();
}

/// Observer that tracks a labeled entity, or refreshes its class when `LabelTarget` is
/// inserted again
pub fn track_label_target(
    insert: On<Insert, LabelTarget>,
    targets: Query<&LabelTarget>,
    mut tracked: ResMut<TrackedObjects>,
) {
    let entity = insert.entity;
    let Ok(target) = targets.get(entity) else {
        return;
    };
    tracked.track(entity, target.class_id);
}

/// Observer that drops an entity from `TrackedObjects` when its `LabelTarget` is removed
pub fn untrack_label_target(remove: On<Remove, LabelTarget>, mut tracked: ResMut<TrackedObjects>) {
    tracked.untrack(remove.entity);
}

/// Steps the trigger and, when it fires, measures every tracked object against the
/// `LabelCamera` view and requests the frame rendered from it.
///
/// Runs in `Last` so transforms and mesh bounds are current for this frame. The image and
/// label file are written by [`complete_label_captures`] once the frame arrives.
#[allow(clippy::too_many_arguments)]
pub fn run_label_capture(
    mut commands: Commands,
    time: Res<Time>,
    mut trigger: ResMut<CaptureTrigger>,
    mut pending: ResMut<PendingCaptures>,
    dataset: Option<Res<DatasetDirectory>>,
    tracked: Res<TrackedObjects>,
    targets: Query<&LabelTarget>,
    camera_query: Query<(Entity, &Camera, &Projection, &GlobalTransform), With<LabelCamera>>,
    geometry: GeometryQueries,
) {
    if !trigger.step(time.delta_secs()) {
        return;
    }

    let Ok((camera_entity, camera, projection, camera_transform)) = camera_query.single() else {
        warn!("Capture requested but there is not exactly one LabelCamera. Skipping capture.");
        return;
    };
    let Some(snapshot) = camera_snapshot(camera, projection, camera_transform) else {
        warn!("LabelCamera {camera_entity:?} has no viewport yet. Skipping capture.");
        return;
    };
    if dataset.is_none() {
        warn!("No dataset directory. Skipping capture.");
        return;
    }

    // `LabelTarget` wins over the class recorded at tracking time, so in-place edits count
    let objects: Vec<_> = tracked
        .iter()
        .map(|object| {
            let class_id = targets
                .get(object.entity)
                .map_or(object.class_id, |target| target.class_id);
            CaptureObject::new(class_id, geometry.object_geometry(object.entity))
        })
        .collect();

    let request_id = pending.next_request_id();
    let plan = CapturePlan::measure(request_id, &snapshot, &objects);

    let tracked_entities: Vec<Entity> = tracked.iter().map(|object| object.entity).collect();
    for skipped in plan.skipped() {
        debug!(
            "Skipped {:?} (class {}): {:?}",
            tracked_entities.get(skipped.position),
            skipped.class_id,
            skipped.reason
        );
    }

    if !plan.has_visible_objects() {
        debug!("No tracked object in view. Nothing captured.");
        return;
    }

    let viewport = plan.frame_request().viewport;
    pending.push(camera_entity, plan);
    commands.trigger(CaptureFrameRequested {
        camera_entity,
        request_id,
        viewport,
    });
}

/// Commits pending captures whose frame has arrived, oldest first.
///
/// A capture still waiting after `LabelConfig::max_frame_wait` updates is dropped. Frames
/// no pending capture can use are discarded.
pub fn complete_label_captures(
    mut commands: Commands,
    config: Res<LabelConfig>,
    mut pending: ResMut<PendingCaptures>,
    mut frames: ResMut<RenderedFrames>,
    mut session: ResMut<CaptureSession>,
    dataset: Option<ResMut<DatasetDirectory>>,
) {
    let Some(mut dataset) = dataset else {
        return;
    };

    while let Some(front) = pending.front() {
        let request_id = front.plan.frame_request().id;

        if !frames.contains(request_id) {
            if front.waited < config.max_frame_wait {
                break;
            }
            warn!(
                "No frame arrived for capture request {request_id} after {} updates. \
                 Dropping capture.",
                front.waited
            );
            pending.pop_front();
            continue;
        }

        let Some(capture) = pending.pop_front() else {
            break;
        };
        match session.commit(capture.plan, &mut *frames, &mut *dataset) {
            Ok(report) => {
                if let Some(image_index) = report.image_index {
                    info!(
                        "Captured image {image_index} with {} label(s)",
                        report.labels.len()
                    );
                    commands.trigger(CaptureComplete {
                        camera_entity: capture.camera_entity,
                        image_index,
                        labels: report.labels,
                    });
                }
            },
            Err(error) => error!("Capture failed: {error}"),
        }
    }

    pending.age();
    match pending.front() {
        Some(front) => frames.discard_before(front.plan.frame_request().id),
        None => frames.clear(),
    }
}
