//! Capture orchestration: one frame, every tracked object, one image and one label file.

use std::collections::VecDeque;

use bevy::prelude::*;

use crate::dataset::ImageStore;
use crate::dataset::LabelStore;
use crate::error::CaptureError;
use crate::frame::FrameRequest;
use crate::frame::FrameSource;
use crate::geometry::CameraView;
use crate::geometry::MeshParts;
use crate::geometry::WorldBounds;
use crate::label::NormalizedLabel;
use crate::projection::screen_rect;
use crate::visibility::ObjectVisibility;
use crate::visibility::SkipReason;
use crate::visibility::test_visibility;

/// A tracked object's geometry paired with the class it is labeled as.
#[derive(Debug, Clone)]
pub struct CaptureObject<G> {
    pub class_id: u32,
    pub geometry: G,
}

impl<G> CaptureObject<G> {
    pub const fn new(class_id: u32, geometry: G) -> Self { Self { class_id, geometry } }
}

/// An object that produced no label, by position in the tracked list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub struct SkippedObject {
    pub position: usize,
    pub class_id: u32,
    pub reason:   SkipReason,
}

/// What one capture produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaptureReport {
    /// Index the image and label file were written under; `None` when nothing was visible
    pub image_index: Option<u64>,
    /// Labels in tracked-object order
    pub labels:      Vec<NormalizedLabel>,
    pub skipped:     Vec<SkippedObject>,
}

/// Visibility and screen-space boxes of every tracked object, measured against one camera
/// view and waiting for the frame rendered from that same view.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturePlan {
    request:     FrameRequest,
    labels:      Vec<NormalizedLabel>,
    skipped:     Vec<SkippedObject>,
    any_visible: bool,
}

impl CapturePlan {
    /// Tests every object against the camera frustum and projects the visible ones.
    ///
    /// A visible object whose parts project to no points still counts as visible: the
    /// capture keeps its image but the object gets no label line.
    pub fn measure<G, C>(request_id: u64, camera: &C, objects: &[CaptureObject<G>]) -> Self
    where
        G: WorldBounds + MeshParts,
        C: CameraView + ?Sized,
    {
        let viewport = camera.viewport_size();
        let mut plan = Self {
            request:     FrameRequest {
                id: request_id,
                viewport,
            },
            labels:      Vec::new(),
            skipped:     Vec::new(),
            any_visible: false,
        };

        for (position, object) in objects.iter().enumerate() {
            let skip = |reason| SkippedObject {
                position,
                class_id: object.class_id,
                reason,
            };

            if let ObjectVisibility::Skipped(reason) =
                test_visibility(&object.geometry, camera.frustum())
            {
                plan.skipped.push(skip(reason));
                continue;
            }
            plan.any_visible = true;

            let rect = screen_rect(&object.geometry, camera);
            if rect.is_empty() {
                plan.skipped.push(skip(SkipReason::NoProjectedPoints));
                continue;
            }

            plan.labels.push(NormalizedLabel::from_screen_rect(
                &rect,
                object.class_id,
                viewport,
            ));
        }

        plan
    }

    /// The frame this plan must be paired with
    pub const fn frame_request(&self) -> FrameRequest { self.request }

    pub const fn has_visible_objects(&self) -> bool { self.any_visible }

    /// Labels in tracked-object order
    pub fn labels(&self) -> &[NormalizedLabel] { &self.labels }

    pub fn skipped(&self) -> &[SkippedObject] { &self.skipped }
}

/// Dataset image counter carried between captures.
///
/// The index advances by exactly one for every capture that persists an image, and only
/// after that image was written.
#[derive(Resource, Reflect, Debug, Clone, Default, PartialEq, Eq)]
#[reflect(Resource)]
pub struct CaptureSession {
    next_index: u64,
}

impl CaptureSession {
    pub const fn new(start_index: u64) -> Self {
        Self {
            next_index: start_index,
        }
    }

    /// Index the next persisted image will use
    pub const fn next_index(&self) -> u64 { self.next_index }

    /// Persists a measured plan: the frame it requested, then every label of the plan under
    /// the same index.
    ///
    /// With no visible object nothing is written and the index is not consumed. A frame
    /// that is missing or of the wrong size aborts the capture the same way.
    pub fn commit<F, S>(
        &mut self,
        plan: CapturePlan,
        frames: &mut F,
        store: &mut S,
    ) -> Result<CaptureReport, CaptureError>
    where
        F: FrameSource + ?Sized,
        S: ImageStore + LabelStore + ?Sized,
    {
        let mut report = CaptureReport {
            image_index: None,
            labels:      Vec::new(),
            skipped:     plan.skipped,
        };

        if !plan.any_visible {
            debug!("No tracked object in view. Nothing captured.");
            return Ok(report);
        }

        let Some(frame) = frames.grab_frame(&plan.request) else {
            return Ok(report);
        };

        let index = self.next_index;
        store.write_image(index, &frame)?;
        self.next_index += 1;
        report.image_index = Some(index);

        store.write_labels(index, &plan.labels)?;
        report.labels = plan.labels;

        Ok(report)
    }

    /// Measures and commits in one step, for frame sources that already hold the frame
    /// rendered from `camera`.
    pub fn capture<G, C, F, S>(
        &mut self,
        request_id: u64,
        camera: &C,
        objects: &[CaptureObject<G>],
        frames: &mut F,
        store: &mut S,
    ) -> Result<CaptureReport, CaptureError>
    where
        G: WorldBounds + MeshParts,
        C: CameraView + ?Sized,
        F: FrameSource + ?Sized,
        S: ImageStore + LabelStore + ?Sized,
    {
        self.commit(CapturePlan::measure(request_id, camera, objects), frames, store)
    }
}

/// A measured plan waiting for its frame.
#[derive(Debug, Clone)]
pub struct PendingCapture {
    pub camera_entity: Entity,
    pub plan:          CapturePlan,
    /// Updates spent waiting so far
    pub waited:        u32,
}

/// Captures whose frame has been requested but not yet committed, oldest first.
#[derive(Resource, Debug)]
pub struct PendingCaptures {
    next_request_id: u64,
    queue:           VecDeque<PendingCapture>,
}

impl Default for PendingCaptures {
    fn default() -> Self {
        Self {
            next_request_id: 1,
            queue:           VecDeque::new(),
        }
    }
}

impl PendingCaptures {
    /// Reserves the id the next frame request is tagged with
    pub const fn next_request_id(&mut self) -> u64 {
        let id = self.next_request_id;
        self.next_request_id += 1;
        id
    }

    pub fn push(&mut self, camera_entity: Entity, plan: CapturePlan) {
        self.queue.push_back(PendingCapture {
            camera_entity,
            plan,
            waited: 0,
        });
    }

    pub fn front(&self) -> Option<&PendingCapture> { self.queue.front() }

    pub fn pop_front(&mut self) -> Option<PendingCapture> { self.queue.pop_front() }

    /// Counts one more update of waiting for every queued capture
    pub fn age(&mut self) {
        for pending in &mut self.queue {
            pending.waited += 1;
        }
    }

    pub fn len(&self) -> usize { self.queue.len() }

    pub fn is_empty(&self) -> bool { self.queue.is_empty() }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    use bevy::math::Affine3A;

    use super::*;
    use crate::camera::CameraSnapshot;
    use crate::frame::Frame;
    use crate::frame::RenderedFrames;
    use crate::geometry::MeshPart;
    use crate::geometry::ObjectGeometry;

    const VIEWPORT: UVec2 = UVec2::new(200, 100);

    const QUAD: [[f32; 3]; 4] = [
        [-1.0, -1.0, 0.0],
        [1.0, -1.0, 0.0],
        [-1.0, 1.0, 0.0],
        [1.0, 1.0, 0.0],
    ];

    /// Orthographic camera: 10 px per world unit, world origin at the viewport center
    fn camera() -> CameraSnapshot {
        let projection = Mat4::orthographic_rh(-10.0, 10.0, -5.0, 5.0, 0.1, 100.0);
        let transform = GlobalTransform::from(Transform::from_xyz(0.0, 0.0, 10.0));
        CameraSnapshot::from_camera(projection, &transform, VIEWPORT)
    }

    fn quad_at(x: f32, y: f32) -> ObjectGeometry<'static> {
        ObjectGeometry::new(
            true,
            vec![MeshPart::from_vertices(
                &QUAD,
                Affine3A::from_translation(Vec3::new(x, y, 0.0)),
            )],
        )
    }

    struct StaticFrames {
        grabs: usize,
    }

    impl FrameSource for StaticFrames {
        fn grab_frame(&mut self, request: &FrameRequest) -> Option<Frame> {
            self.grabs += 1;
            let len = request.viewport.x as usize * request.viewport.y as usize * 3;
            Frame::from_rgb(request.viewport.x, request.viewport.y, vec![0; len]).ok()
        }
    }

    struct NoFrames;

    impl FrameSource for NoFrames {
        fn grab_frame(&mut self, _request: &FrameRequest) -> Option<Frame> { None }
    }

    #[derive(Default)]
    struct MemoryStore {
        images:      Vec<u64>,
        labels:      BTreeMap<u64, Vec<String>>,
        fail_images: bool,
    }

    impl ImageStore for MemoryStore {
        fn write_image(&mut self, index: u64, _frame: &Frame) -> Result<PathBuf, CaptureError> {
            if self.fail_images {
                return Err(CaptureError::InvalidFrame {
                    width:  0,
                    height: 0,
                    len:    0,
                });
            }
            self.images.push(index);
            Ok(PathBuf::from(format!("{index}.png")))
        }
    }

    impl LabelStore for MemoryStore {
        fn write_labels(
            &mut self,
            index: u64,
            labels: &[NormalizedLabel],
        ) -> Result<PathBuf, CaptureError> {
            let lines = labels.iter().map(ToString::to_string).collect();
            self.labels.insert(index, lines);
            Ok(PathBuf::from(format!("{index}.txt")))
        }
    }

    fn run(
        session: &mut CaptureSession,
        objects: &[CaptureObject<ObjectGeometry<'static>>],
        store: &mut MemoryStore,
    ) -> CaptureReport {
        let mut frames = StaticFrames { grabs: 0 };
        let report = session
            .capture(0, &camera(), objects, &mut frames, store)
            .expect("capture succeeds");
        assert!(frames.grabs <= 1);
        report
    }

    #[test]
    fn all_visible_objects_share_one_image_and_label_file() {
        let objects = [
            CaptureObject::new(2, quad_at(0.0, 0.0)),
            CaptureObject::new(0, quad_at(500.0, 0.0)),
            CaptureObject::new(5, quad_at(-5.0, 2.0)),
        ];
        let mut session = CaptureSession::new(10);
        let mut store = MemoryStore::default();

        let report = run(&mut session, &objects, &mut store);

        assert_eq!(report.image_index, Some(10));
        assert_eq!(session.next_index(), 11);
        assert_eq!(store.images, [10]);
        assert_eq!(
            store.labels[&10],
            ["2 0.5 0.5 0.1 0.2", "5 0.25 0.7 0.1 0.2"]
        );
        assert_eq!(
            report.skipped,
            [SkippedObject {
                position: 1,
                class_id: 0,
                reason:   SkipReason::OutsideFrustum,
            }]
        );
    }

    #[test]
    fn nothing_visible_writes_nothing_and_keeps_index() {
        let objects = [
            CaptureObject::new(1, quad_at(500.0, 0.0)),
            CaptureObject::new(1, ObjectGeometry::new(false, Vec::new())),
        ];
        let mut session = CaptureSession::new(3);
        let mut store = MemoryStore::default();

        let report = run(&mut session, &objects, &mut store);

        assert_eq!(report.image_index, None);
        assert_eq!(session.next_index(), 3);
        assert!(store.images.is_empty());
        assert!(store.labels.is_empty());
        assert_eq!(report.skipped.len(), 2);
        assert_eq!(report.skipped[1].reason, SkipReason::Disabled);
    }

    #[test]
    fn index_advances_once_per_capture_with_visible_objects() {
        let visible = [
            CaptureObject::new(0, quad_at(0.0, 0.0)),
            CaptureObject::new(1, quad_at(2.0, 0.0)),
        ];
        let hidden = [CaptureObject::new(0, quad_at(0.0, 500.0))];
        let mut session = CaptureSession::default();
        let mut store = MemoryStore::default();

        run(&mut session, &visible, &mut store);
        run(&mut session, &hidden, &mut store);
        run(&mut session, &visible, &mut store);

        assert_eq!(session.next_index(), 2);
        assert_eq!(store.images, [0, 1]);
        assert_eq!(store.labels[&1].len(), 2);
    }

    #[test]
    fn object_without_parts_emits_no_label() {
        let objects = [
            CaptureObject::new(7, ObjectGeometry::new(true, Vec::new())),
            CaptureObject::new(8, quad_at(0.0, 0.0)),
        ];
        let mut session = CaptureSession::default();
        let mut store = MemoryStore::default();

        let report = run(&mut session, &objects, &mut store);

        assert_eq!(report.labels.len(), 1);
        assert_eq!(report.labels[0].class_id, 8);
        assert_eq!(report.skipped[0].reason, SkipReason::NoGeometry);
    }

    #[test]
    fn visible_object_without_vertices_still_consumes_index() {
        // bounds present but vertex data missing
        let part = MeshPart {
            vertices:       None,
            local_bounds:   Some((Vec3::ZERO, Vec3::ONE)),
            local_to_world: Affine3A::IDENTITY,
        };
        let objects = [CaptureObject::new(4, ObjectGeometry::new(true, vec![part]))];
        let mut session = CaptureSession::default();
        let mut store = MemoryStore::default();

        let report = run(&mut session, &objects, &mut store);

        assert_eq!(report.image_index, Some(0));
        assert!(report.labels.is_empty());
        assert_eq!(report.skipped[0].reason, SkipReason::NoProjectedPoints);
        assert!(store.labels[&0].is_empty());
    }

    #[test]
    fn failed_image_write_keeps_index() {
        let objects = [CaptureObject::new(0, quad_at(0.0, 0.0))];
        let mut session = CaptureSession::new(6);
        let mut store = MemoryStore {
            fail_images: true,
            ..Default::default()
        };

        let result = session.capture(
            0,
            &camera(),
            &objects,
            &mut StaticFrames { grabs: 0 },
            &mut store,
        );

        assert!(result.is_err());
        assert_eq!(session.next_index(), 6);
        assert!(store.labels.is_empty());
    }

    #[test]
    fn missing_frame_aborts_capture() {
        let objects = [CaptureObject::new(0, quad_at(0.0, 0.0))];
        let mut session = CaptureSession::default();
        let mut store = MemoryStore::default();

        let report = session
            .capture(0, &camera(), &objects, &mut NoFrames, &mut store)
            .expect("no frame is not an error");

        assert_eq!(report, CaptureReport::default());
        assert_eq!(session.next_index(), 0);
        assert!(store.images.is_empty());
    }

    #[test]
    fn recapturing_an_index_overwrites_its_labels() {
        let mut store = MemoryStore::default();

        let many = [
            CaptureObject::new(0, quad_at(0.0, 0.0)),
            CaptureObject::new(1, quad_at(3.0, 0.0)),
        ];
        run(&mut CaptureSession::new(0), &many, &mut store);

        let one = [CaptureObject::new(9, quad_at(0.0, 0.0))];
        run(&mut CaptureSession::new(0), &one, &mut store);

        assert_eq!(store.labels[&0], ["9 0.5 0.5 0.1 0.2"]);
    }

    #[test]
    fn nothing_visible_never_grabs_a_frame() {
        let objects = [CaptureObject::new(1, quad_at(500.0, 0.0))];
        let mut frames = StaticFrames { grabs: 0 };

        let report = CaptureSession::default()
            .capture(0, &camera(), &objects, &mut frames, &mut MemoryStore::default())
            .expect("nothing to write");

        assert_eq!(report.image_index, None);
        assert_eq!(frames.grabs, 0);
    }

    #[test]
    fn plan_only_accepts_the_frame_it_requested() {
        let objects = [CaptureObject::new(3, quad_at(0.0, 0.0))];
        let plan = CapturePlan::measure(7, &camera(), &objects);
        assert_eq!(plan.frame_request().id, 7);

        let mut frames = RenderedFrames::default();
        frames.store(6, Frame::from_rgb(200, 100, vec![0; 200 * 100 * 3]).expect("valid size"));
        let mut session = CaptureSession::new(2);
        let mut store = MemoryStore::default();

        let report = session
            .commit(plan.clone(), &mut frames, &mut store)
            .expect("missing frame is not an error");
        assert_eq!(report.image_index, None);
        assert_eq!(session.next_index(), 2);

        frames.store(7, Frame::from_rgb(200, 100, vec![0; 200 * 100 * 3]).expect("valid size"));
        let report = session
            .commit(plan, &mut frames, &mut store)
            .expect("capture succeeds");
        assert_eq!(report.image_index, Some(2));
        assert_eq!(store.labels[&2], ["3 0.5 0.5 0.1 0.2"]);
    }

    #[test]
    fn plan_keeps_labels_measured_before_the_view_changed() {
        let mut objects = vec![CaptureObject::new(1, quad_at(0.0, 0.0))];
        let plan = CapturePlan::measure(1, &camera(), &objects);

        // the object moves before the frame arrives
        objects[0] = CaptureObject::new(1, quad_at(-5.0, 2.0));
        let moved = CapturePlan::measure(2, &camera(), &objects);
        assert_eq!(moved.labels()[0].to_string(), "1 0.25 0.7 0.1 0.2");

        let mut store = MemoryStore::default();
        CaptureSession::default()
            .commit(plan, &mut StaticFrames { grabs: 0 }, &mut store)
            .expect("capture succeeds");

        assert_eq!(store.labels[&0], ["1 0.5 0.5 0.1 0.2"]);
    }
}
