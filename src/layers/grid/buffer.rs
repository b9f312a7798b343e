//! Double-buffered tile containers for animated zoom.
//!
//! The front container holds the tiles of the current zoom. During a zoom
//! animation the previous imagery stays in the back container, scaled along
//! with the animation, until the new tiles have loaded.

use crate::{
    core::{
        constants::{BACK_CONTAINER_Z_INDEX, FRONT_CONTAINER_Z_INDEX, LOADED_SHARE_THRESHOLD},
        geo::Point,
    },
    prelude::{Duration, Instant},
    traits::{MatrixTransform, TileRenderer},
};
use serde::{Deserialize, Serialize};
use std::mem;

/// 2D affine transform of a tile container, in the CSS matrix layout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomTransform {
    pub matrix: [f64; 6],
}

impl Default for ZoomTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl ZoomTransform {
    pub fn identity() -> Self {
        Self {
            matrix: [1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
        }
    }

    pub fn translate(delta: Point) -> Self {
        Self {
            matrix: Point::create_transform_matrix(delta, 1.0),
        }
    }

    /// Scale by `scale` keeping `origin` fixed.
    pub fn scale_about(scale: f64, origin: Point) -> Self {
        Self {
            matrix: Point::create_transform_matrix(origin.multiply(1.0 - scale), scale),
        }
    }

    /// `self` applied after `inner`.
    pub fn after(&self, inner: &ZoomTransform) -> Self {
        Self {
            matrix: Point::combine_matrices(&self.matrix, &inner.matrix),
        }
    }

    pub fn apply(&self, point: &Point) -> Point {
        point.apply_transform(&self.matrix)
    }

    pub fn scale(&self) -> f64 {
        self.matrix[0]
    }

    pub fn translation(&self) -> Point {
        Point::new(self.matrix[4], self.matrix[5])
    }

    pub fn is_identity(&self) -> bool {
        let identity = Self::identity().matrix;
        self.matrix
            .iter()
            .zip(identity.iter())
            .all(|(a, b)| (a - b).abs() < 1e-9)
    }
}

/// One frame of a host zoom animation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomAnimEvent {
    /// Scale of the target zoom relative to the current one.
    pub scale: f64,
    /// Fixed point of the scaling, in layer pixels.
    pub origin: Point,
    /// Offset applied first on backwards frames.
    pub delta: Option<Point>,
    /// The animation runs back towards the starting zoom.
    pub backwards: bool,
}

impl ZoomAnimEvent {
    pub fn new(scale: f64, origin: Point) -> Self {
        Self {
            scale,
            origin,
            delta: None,
            backwards: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferState {
    Idle,
    Animating,
}

/// What the first frame of an animation did with the containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferPreparation {
    /// The back container already showed a mostly loaded image; the mostly
    /// empty front was hidden instead.
    KeptBack,
    /// Front and back traded roles.
    Swapped,
}

/// Front/back container pair plus the state of the running zoom animation.
#[derive(Debug)]
pub struct ZoomTransitionBuffer<C> {
    front: C,
    back: C,
    state: BufferState,
    back_transform: Option<ZoomTransform>,
    back_loaded_share: f64,
    clear_delay: Duration,
    clear_due: Option<Instant>,
}

impl<C> ZoomTransitionBuffer<C> {
    pub fn new(front: C, back: C, clear_delay: Duration) -> Self {
        Self {
            front,
            back,
            state: BufferState::Idle,
            back_transform: None,
            back_loaded_share: 0.0,
            clear_delay,
            clear_due: None,
        }
    }

    /// Container new tiles are attached to.
    pub fn front(&self) -> &C {
        &self.front
    }

    /// Container holding the previous zoom's imagery.
    pub fn back(&self) -> &C {
        &self.back
    }

    pub fn state(&self) -> BufferState {
        self.state
    }

    pub fn is_animating(&self) -> bool {
        self.state == BufferState::Animating
    }

    pub fn back_transform(&self) -> Option<&ZoomTransform> {
        self.back_transform.as_ref()
    }

    /// Resolved share of the imagery left in the back container.
    pub fn back_loaded_share(&self) -> f64 {
        self.back_loaded_share
    }

    pub fn set_back_loaded_share(&mut self, share: f64) {
        self.back_loaded_share = share;
    }

    pub fn clear_due(&self) -> Option<Instant> {
        self.clear_due
    }

    /// First frame of a zoom animation; `None` when one is already running.
    ///
    /// The caller stops the still-loading tiles of the retired container
    /// afterwards, since only it knows which tiles are pending.
    pub fn begin<R>(&mut self, front_loaded_share: f64, renderer: &mut R) -> Option<BufferPreparation>
    where
        R: TileRenderer<Container = C>,
    {
        if self.is_animating() {
            return None;
        }
        self.state = BufferState::Animating;

        let preparation = if self.back_loaded_share > LOADED_SHARE_THRESHOLD
            && front_loaded_share < LOADED_SHARE_THRESHOLD
        {
            renderer.set_visible(&self.front, false);
            BufferPreparation::KeptBack
        } else {
            // The back container becomes the new front: hide and reset it first.
            renderer.set_visible(&self.back, false);
            renderer.set_transform(&self.back, None);
            self.back_transform = None;
            mem::swap(&mut self.front, &mut self.back);
            BufferPreparation::Swapped
        };

        // The old imagery must survive the animation.
        self.clear_due = None;
        renderer.flush(&self.back);

        log::debug!("zoom animation started: {:?}", preparation);
        Some(preparation)
    }

    /// Scale the back container for one animation frame.
    pub fn animate<R>(&mut self, event: &ZoomAnimEvent, renderer: &mut R) -> ZoomTransform
    where
        R: TileRenderer<Container = C>,
    {
        let scale = ZoomTransform::scale_about(event.scale, event.origin);
        let current = self.back_transform.unwrap_or_default();

        let transform = match (event.backwards, event.delta) {
            (true, Some(delta)) => ZoomTransform::translate(delta).after(&scale),
            (true, None) => current.after(&scale),
            (false, _) => scale.after(&current),
        };

        renderer.set_transform(&self.back, Some(&transform));
        self.back_transform = Some(transform);
        transform
    }

    /// Last frame: the front shows on top, the back stays behind it.
    pub fn end<R>(&mut self, renderer: &mut R)
    where
        R: TileRenderer<Container = C>,
    {
        renderer.set_visible(&self.front, true);
        renderer.set_z_index(&self.front, FRONT_CONTAINER_Z_INDEX);
        renderer.set_z_index(&self.back, BACK_CONTAINER_Z_INDEX);
        renderer.flush(&self.back);

        self.state = BufferState::Idle;
    }

    /// (Re)arm the delayed back-container clear.
    pub fn schedule_clear(&mut self, now: Instant) {
        self.clear_due = Some(now + self.clear_delay);
    }

    pub fn cancel_clear(&mut self) {
        self.clear_due = None;
    }

    /// Run the scheduled clear once its delay has passed.
    pub fn clear_if_due<R>(&mut self, now: Instant, zooming: bool, renderer: &mut R) -> bool
    where
        R: TileRenderer<Container = C>,
    {
        match self.clear_due {
            Some(due) if now >= due => {
                self.clear_due = None;
                self.clear(zooming, renderer)
            }
            _ => false,
        }
    }

    /// Empty the back container unless a zoom is in progress.
    pub fn clear<R>(&mut self, zooming: bool, renderer: &mut R) -> bool
    where
        R: TileRenderer<Container = C>,
    {
        if zooming {
            log::debug!("skipping back buffer clear: map is zooming");
            return false;
        }

        renderer.clear(&self.back);
        renderer.set_transform(&self.back, None);
        self.back_transform = None;
        self.back_loaded_share = 0.0;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiles::key::TileCoordinate;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    impl TileRenderer for Recorder {
        type Visual = u32;
        type Container = &'static str;

        fn create_container(&mut self, _parent: Option<&Self::Container>) -> Self::Container {
            "container"
        }

        fn create_visual(&mut self, _coord: &TileCoordinate) -> Self::Visual {
            0
        }

        fn attach(&mut self, _visual: &Self::Visual, _parent: &Self::Container) {}

        fn detach(&mut self, _visual: &Self::Visual) {}

        fn set_position(&mut self, _visual: &Self::Visual, _position: Point) {}

        fn clear(&mut self, container: &Self::Container) {
            self.calls.push(format!("clear {}", container));
        }

        fn set_visible(&mut self, container: &Self::Container, visible: bool) {
            self.calls.push(format!("visible {} {}", container, visible));
        }

        fn set_z_index(&mut self, container: &Self::Container, z_index: i32) {
            self.calls.push(format!("z {} {}", container, z_index));
        }

        fn set_transform(&mut self, container: &Self::Container, transform: Option<&ZoomTransform>) {
            let label = if transform.is_some() { "set" } else { "reset" };
            self.calls.push(format!("transform {} {}", container, label));
        }
    }

    fn buffer() -> ZoomTransitionBuffer<&'static str> {
        ZoomTransitionBuffer::new("a", "b", Duration::from_millis(500))
    }

    #[test]
    fn test_scale_about_keeps_origin_fixed() {
        let origin = Point::new(100.0, 50.0);
        let transform = ZoomTransform::scale_about(2.0, origin);

        assert_eq!(transform.apply(&origin), origin);
        assert_eq!(transform.apply(&Point::new(110.0, 50.0)), Point::new(120.0, 50.0));
        assert!(ZoomTransform::default().is_identity());
    }

    #[test]
    fn test_first_frame_swaps_roles_once() {
        let mut buffer = buffer();
        let mut renderer = Recorder::default();

        assert_eq!(buffer.begin(1.0, &mut renderer), Some(BufferPreparation::Swapped));
        assert_eq!((*buffer.front(), *buffer.back()), ("b", "a"));
        assert!(buffer.is_animating());
        assert!(renderer.calls.contains(&"visible b false".to_string()));

        // Re-entrant start is ignored.
        assert_eq!(buffer.begin(1.0, &mut renderer), None);
        assert_eq!(*buffer.front(), "b");
    }

    #[test]
    fn test_loaded_back_is_kept_over_empty_front() {
        let mut buffer = buffer();
        let mut renderer = Recorder::default();
        buffer.set_back_loaded_share(1.0);

        assert_eq!(buffer.begin(0.2, &mut renderer), Some(BufferPreparation::KeptBack));
        assert_eq!((*buffer.front(), *buffer.back()), ("a", "b"));
        assert_eq!(renderer.calls[0], "visible a false");
    }

    #[test]
    fn test_begin_cancels_scheduled_clear() {
        let mut buffer = buffer();
        let mut renderer = Recorder::default();
        buffer.schedule_clear(Instant::now());

        buffer.begin(1.0, &mut renderer);
        assert_eq!(buffer.clear_due(), None);
    }

    #[test]
    fn test_animation_frames_compose() {
        let mut buffer = buffer();
        let mut renderer = Recorder::default();
        buffer.begin(1.0, &mut renderer);

        let origin = Point::new(0.0, 0.0);
        buffer.animate(&ZoomAnimEvent::new(2.0, origin), &mut renderer);
        let second = buffer.animate(&ZoomAnimEvent::new(1.5, origin), &mut renderer);
        assert!((second.scale() - 3.0).abs() < 1e-9);

        let backwards = ZoomAnimEvent {
            scale: 0.5,
            origin,
            delta: Some(Point::new(10.0, -4.0)),
            backwards: true,
        };
        let third = buffer.animate(&backwards, &mut renderer);
        assert!((third.scale() - 0.5).abs() < 1e-9);
        assert_eq!(third.translation(), Point::new(10.0, -4.0));
        assert_eq!(buffer.back_transform(), Some(&third));
    }

    #[test]
    fn test_end_orders_containers() {
        let mut buffer = buffer();
        let mut renderer = Recorder::default();
        buffer.begin(1.0, &mut renderer);
        renderer.calls.clear();

        buffer.end(&mut renderer);
        assert_eq!(buffer.state(), BufferState::Idle);
        assert_eq!(renderer.calls, vec!["visible b true", "z b 2", "z a 1"]);
    }

    #[test]
    fn test_clear_is_debounced_and_guarded() {
        let mut buffer = buffer();
        let mut renderer = Recorder::default();
        let t0 = Instant::now();
        buffer.set_back_loaded_share(1.0);

        buffer.schedule_clear(t0);
        assert!(!buffer.clear_if_due(t0 + Duration::from_millis(499), false, &mut renderer));

        // Rescheduling pushes the deadline out.
        buffer.schedule_clear(t0 + Duration::from_millis(300));
        assert!(!buffer.clear_if_due(t0 + Duration::from_millis(600), false, &mut renderer));
        assert!(buffer.clear_if_due(t0 + Duration::from_millis(800), false, &mut renderer));
        assert!(renderer.calls.contains(&"clear b".to_string()));
        assert_eq!(buffer.back_loaded_share(), 0.0);

        buffer.schedule_clear(t0);
        buffer.set_back_loaded_share(1.0);
        assert!(!buffer.clear_if_due(t0 + Duration::from_secs(1), true, &mut renderer));
        assert_eq!(buffer.back_loaded_share(), 1.0);
        assert_eq!(buffer.clear_due(), None);
    }
}
