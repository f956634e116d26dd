mod bitmap;
mod object;

use std::sync::Arc;

use image::{imageops, RgbaImage};
use serde::{Deserialize, Serialize};

pub use bitmap::{BitmapId, BitmapStore};
pub use object::{
    LineCap, ObjectId, ObjectProperty, Shape, VisualObject, TEXT_ADVANCE_RATIO,
    TEXT_LINE_HEIGHT_RATIO,
};

use crate::error::{EngineError, EngineResult};
use crate::filter::{FilterKind, FilterStack};
use crate::geometry::{CanvasSize, Point, Rect};
use crate::history::Snapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZDirection {
    Forward,
    Backward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterTarget {
    Background,
    Object(ObjectId),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    None,
    Single(ObjectId),
    /// Multi-object reference held while mask strokes are collected.
    Multiple(Vec<ObjectId>),
}

/// Change notifications queued by the scene and drained by the editor.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    ObjectAdded(ObjectId),
    ObjectRemoved(ObjectId),
    ObjectModified(ObjectId),
    Reordered(ObjectId),
    FiltersChanged(FilterTarget),
    BackgroundChanged,
    /// Several committed mutations applied as one edit.
    Batch(&'static str),
    SelectionChanged(Option<ObjectId>),
    TransientChanged,
    Reloaded,
}

impl SceneEvent {
    /// Whether the event represents an edit that belongs in history.
    pub const fn is_committed(&self) -> bool {
        !matches!(
            self,
            Self::SelectionChanged(_) | Self::TransientChanged | Self::Reloaded
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum QuarterTurns {
    #[default]
    None,
    Once,
    Twice,
    Thrice,
}

impl QuarterTurns {
    pub const fn next(self) -> Self {
        match self {
            Self::None => Self::Once,
            Self::Once => Self::Twice,
            Self::Twice => Self::Thrice,
            Self::Thrice => Self::None,
        }
    }

    pub const fn degrees(self) -> u16 {
        match self {
            Self::None => 0,
            Self::Once => 90,
            Self::Twice => 180,
            Self::Thrice => 270,
        }
    }

    pub const fn from_degrees(degrees: i32) -> Self {
        match degrees.rem_euclid(360) / 90 {
            1 => Self::Once,
            2 => Self::Twice,
            3 => Self::Thrice,
            _ => Self::None,
        }
    }

    pub const fn swaps_axes(self) -> bool {
        matches!(self, Self::Once | Self::Thrice)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundImage {
    pub bitmap: BitmapId,
    pub filters: FilterStack,
    pub rotation: QuarterTurns,
    pub flip_x: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct SceneState {
    size: CanvasSize,
    background: Option<BackgroundImage>,
    objects: Vec<VisualObject>,
    next_id: u64,
}

#[derive(Debug, Clone)]
pub struct SceneGraph {
    size: CanvasSize,
    background: Option<BackgroundImage>,
    displayed_background: Option<Arc<RgbaImage>>,
    objects: Vec<VisualObject>,
    selection: Selection,
    bitmaps: BitmapStore,
    next_id: u64,
    events: Vec<SceneEvent>,
    batch_depth: u32,
    batch_dirty: bool,
}

impl SceneGraph {
    pub fn new(size: CanvasSize) -> Self {
        Self {
            size,
            background: None,
            displayed_background: None,
            objects: Vec::new(),
            selection: Selection::None,
            bitmaps: BitmapStore::new(),
            next_id: 1,
            events: Vec::new(),
            batch_depth: 0,
            batch_dirty: false,
        }
    }

    /// Scene sized to `image` with it as the background.
    pub fn with_background(image: RgbaImage) -> Self {
        let size = CanvasSize::new(image.width(), image.height());
        let mut scene = Self::new(size);
        let bitmap = scene.bitmaps.insert(image);
        scene.background = Some(BackgroundImage {
            bitmap,
            filters: FilterStack::new(),
            rotation: QuarterTurns::None,
            flip_x: false,
        });
        scene.recompose_background();
        scene
    }

    /// Restores a scene from a serialized state and the bitmaps it references.
    pub fn from_snapshot(snapshot: &Snapshot, bitmaps: BitmapStore) -> EngineResult<Self> {
        let mut scene = Self::new(CanvasSize::new(1, 1));
        scene.bitmaps = bitmaps;
        scene.restore(snapshot)?;
        scene.events.clear();
        Ok(scene)
    }

    pub fn size(&self) -> CanvasSize {
        self.size
    }

    pub fn background(&self) -> Option<&BackgroundImage> {
        self.background.as_ref()
    }

    /// Background pixels with filters and orientation applied.
    pub fn displayed_background(&self) -> Option<&Arc<RgbaImage>> {
        self.displayed_background.as_ref()
    }

    pub fn bitmaps(&self) -> &BitmapStore {
        &self.bitmaps
    }

    pub fn insert_bitmap(&mut self, image: RgbaImage) -> BitmapId {
        self.bitmaps.insert(image)
    }

    /// All objects in insertion order, transient ones included.
    pub fn objects(&self) -> &[VisualObject] {
        &self.objects
    }

    pub fn objects_in_z_order(&self) -> Vec<&VisualObject> {
        let mut ordered = self.objects.iter().collect::<Vec<_>>();
        ordered.sort_by_key(|object| object.z_index);
        ordered
    }

    /// Number of committed (non-transient) objects.
    pub fn object_count(&self) -> usize {
        self.objects.iter().filter(|object| !object.transient).count()
    }

    pub fn object(&self, id: ObjectId) -> Option<&VisualObject> {
        self.objects.iter().find(|object| object.id == id)
    }

    fn object_mut(&mut self, id: ObjectId) -> Option<&mut VisualObject> {
        self.objects.iter_mut().find(|object| object.id == id)
    }

    fn allocate_id(&mut self) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        id
    }

    fn emit(&mut self, event: SceneEvent) {
        if self.batch_depth > 0 && event.is_committed() {
            self.batch_dirty = true;
            return;
        }
        self.events.push(event);
    }

    pub fn drain_events(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.events)
    }

    /// Starts grouping committed mutations into a single [`SceneEvent::Batch`].
    pub fn begin_batch(&mut self) {
        self.batch_depth = self.batch_depth.saturating_add(1);
    }

    pub fn end_batch(&mut self, label: &'static str) {
        self.batch_depth = self.batch_depth.saturating_sub(1);
        if self.batch_depth == 0 && std::mem::take(&mut self.batch_dirty) {
            self.events.push(SceneEvent::Batch(label));
        }
    }

    fn insert(&mut self, mut object: VisualObject, transient: bool) -> EngineResult<ObjectId> {
        object.validate()?;
        let id = self.allocate_id();
        object.id = id;
        object.z_index = self.objects.len();
        object.transient = transient;
        self.objects.push(object);
        tracing::debug!(id = %id, z = self.objects.len() - 1, transient, "object added");
        Ok(id)
    }

    pub fn add_object(&mut self, object: VisualObject) -> EngineResult<ObjectId> {
        let id = self.insert(object, false)?;
        self.emit(SceneEvent::ObjectAdded(id));
        Ok(id)
    }

    /// Adds an object that is drawn interactively but never recorded or exported.
    pub fn add_transient_object(&mut self, object: VisualObject) -> EngineResult<ObjectId> {
        let id = self.insert(object, true)?;
        self.emit(SceneEvent::TransientChanged);
        Ok(id)
    }

    /// Removes `id`, closing the z-order gap. Absent ids are ignored.
    pub fn remove_object(&mut self, id: ObjectId) -> bool {
        let Some(index) = self.objects.iter().position(|object| object.id == id) else {
            return false;
        };
        let removed = self.objects.remove(index);
        for object in &mut self.objects {
            if object.z_index > removed.z_index {
                object.z_index -= 1;
            }
        }
        self.drop_from_selection(id);
        tracing::debug!(id = %id, "object removed");
        if removed.transient {
            self.emit(SceneEvent::TransientChanged);
        } else {
            self.emit(SceneEvent::ObjectRemoved(id));
        }
        true
    }

    pub fn set_object_property(
        &mut self,
        id: ObjectId,
        property: ObjectProperty,
    ) -> EngineResult<()> {
        property.validate()?;
        let object = self
            .object_mut(id)
            .ok_or(EngineError::ObjectNotFound { id })?;
        let mut updated = object.clone();
        updated.apply(property);
        updated.validate()?;
        let transient = updated.transient;
        *object = updated;
        if transient {
            self.emit(SceneEvent::TransientChanged);
        } else {
            self.emit(SceneEvent::ObjectModified(id));
        }
        Ok(())
    }

    /// Moves an object without recording an edit; used while a drag is in flight.
    pub fn translate_preview(&mut self, id: ObjectId, dx: f32, dy: f32) -> EngineResult<()> {
        let object = self
            .object_mut(id)
            .ok_or(EngineError::ObjectNotFound { id })?;
        object.x += dx;
        object.y += dy;
        Ok(())
    }

    /// Swaps z-order with the adjacent object. No-op at either extremity.
    pub fn reorder(&mut self, id: ObjectId, direction: ZDirection) -> bool {
        let Some(current) = self.object(id).map(|object| object.z_index) else {
            return false;
        };
        let target = match direction {
            ZDirection::Forward if current + 1 < self.objects.len() => current + 1,
            ZDirection::Backward if current > 0 => current - 1,
            _ => return false,
        };
        for object in &mut self.objects {
            if object.z_index == target {
                object.z_index = current;
            } else if object.id == id {
                object.z_index = target;
            }
        }
        self.emit(SceneEvent::Reordered(id));
        true
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selected(&self) -> Option<ObjectId> {
        match self.selection {
            Selection::Single(id) => Some(id),
            _ => None,
        }
    }

    /// Single selection. Unknown ids clear the selection instead of failing.
    pub fn set_selection(&mut self, id: Option<ObjectId>) {
        let next = match id {
            Some(id) if self.object(id).is_some() => Selection::Single(id),
            _ => Selection::None,
        };
        if next != self.selection {
            self.selection = next;
            self.emit(SceneEvent::SelectionChanged(self.selected()));
        }
    }

    pub fn select_many(&mut self, ids: Vec<ObjectId>) {
        let ids = ids
            .into_iter()
            .filter(|id| self.object(*id).is_some())
            .collect::<Vec<_>>();
        self.selection = if ids.is_empty() {
            Selection::None
        } else {
            Selection::Multiple(ids)
        };
        self.emit(SceneEvent::SelectionChanged(None));
    }

    fn drop_from_selection(&mut self, id: ObjectId) {
        match &mut self.selection {
            Selection::Single(selected) if *selected == id => {
                self.selection = Selection::None;
                self.events.push(SceneEvent::SelectionChanged(None));
            }
            Selection::Multiple(ids) => {
                ids.retain(|selected| *selected != id);
                if ids.is_empty() {
                    self.selection = Selection::None;
                }
            }
            _ => {}
        }
    }

    /// Topmost eventable object under `point`.
    pub fn hit_test(&self, point: Point) -> Option<ObjectId> {
        self.objects_in_z_order()
            .into_iter()
            .rev()
            .find(|object| object.eventable && object.contains(point))
            .map(|object| object.id)
    }

    pub fn bounding_rect(&self, id: ObjectId) -> EngineResult<Rect> {
        self.object(id)
            .map(VisualObject::bounding_rect)
            .ok_or(EngineError::ObjectNotFound { id })
    }

    /// Applies tool-mode interaction flags to every object.
    pub fn set_interaction_flags(&mut self, selectable: bool, eventable: bool) {
        for object in &mut self.objects {
            object.selectable = selectable;
            object.eventable = eventable;
        }
    }

    pub fn set_object_interaction(&mut self, id: ObjectId, selectable: bool, eventable: bool) {
        if let Some(object) = self.object_mut(id) {
            object.selectable = selectable;
            object.eventable = eventable;
        }
    }

    /// Resets interaction flags to each object's persistent interactivity.
    pub fn reset_interaction_flags(&mut self) {
        for object in &mut self.objects {
            object.selectable = object.interactive;
            object.eventable = object.interactive;
        }
    }

    pub fn translate_all(&mut self, dx: f32, dy: f32) {
        let mut moved = Vec::new();
        for object in &mut self.objects {
            object.x += dx;
            object.y += dy;
            if !object.transient {
                moved.push(object.id);
            }
        }
        for id in moved {
            self.emit(SceneEvent::ObjectModified(id));
        }
    }

    /// Clamps and applies one filter parameter, then recomposes the target.
    pub fn set_filter_parameter(
        &mut self,
        target: FilterTarget,
        kind: FilterKind,
        value: f32,
    ) -> EngineResult<f32> {
        let applied = match target {
            FilterTarget::Background => {
                let background = self.background.as_mut().ok_or_else(|| {
                    EngineError::invalid_geometry("scene has no background image")
                })?;
                let applied = background.filters.set(kind, value);
                self.recompose_background();
                applied
            }
            FilterTarget::Object(id) => {
                let object = self
                    .object_mut(id)
                    .ok_or(EngineError::ObjectNotFound { id })?;
                match &mut object.shape {
                    Shape::Image { filters, .. } => filters.set(kind, value),
                    other => {
                        return Err(EngineError::invalid_geometry(format!(
                            "filters apply to images, not {}",
                            other.kind_name()
                        )))
                    }
                }
            }
        };
        tracing::debug!(?target, kind = kind.label(), value = applied, "filter parameter set");
        self.emit(SceneEvent::FiltersChanged(target));
        Ok(applied)
    }

    /// Installs `image` as the new background, resizing the canvas to it.
    pub fn replace_background(&mut self, image: RgbaImage) {
        self.size = CanvasSize::new(image.width(), image.height());
        let bitmap = self.bitmaps.insert(image);
        self.background = Some(BackgroundImage {
            bitmap,
            filters: FilterStack::new(),
            rotation: QuarterTurns::None,
            flip_x: false,
        });
        self.recompose_background();
        self.emit(SceneEvent::BackgroundChanged);
    }

    /// Resizes the canvas without touching the background bitmap.
    pub fn resize_canvas(&mut self, size: CanvasSize) {
        self.size = size;
        self.recompose_background();
        self.emit(SceneEvent::BackgroundChanged);
    }

    pub fn rotate_background(&mut self) -> bool {
        let Some(background) = self.background.as_mut() else {
            return false;
        };
        background.rotation = background.rotation.next();
        self.size = CanvasSize::new(self.size.height, self.size.width);
        self.recompose_background();
        self.emit(SceneEvent::BackgroundChanged);
        true
    }

    pub fn flip_background(&mut self) -> bool {
        let Some(background) = self.background.as_mut() else {
            return false;
        };
        background.flip_x = !background.flip_x;
        self.recompose_background();
        self.emit(SceneEvent::BackgroundChanged);
        true
    }

    /// Recomputes displayed background pixels from bitmap, filters and orientation.
    fn recompose_background(&mut self) {
        self.displayed_background = self.background.as_ref().and_then(|background| {
            let source = self.bitmaps.get(background.bitmap)?;
            let mut image = background.filters.apply(source);
            if background.flip_x {
                imageops::flip_horizontal_in_place(&mut image);
            }
            image = match background.rotation {
                QuarterTurns::None => image,
                QuarterTurns::Once => imageops::rotate90(&image),
                QuarterTurns::Twice => imageops::rotate180(&image),
                QuarterTurns::Thrice => imageops::rotate270(&image),
            };
            if image.dimensions() != (self.size.width, self.size.height) {
                image = imageops::resize(
                    &image,
                    self.size.width.max(1),
                    self.size.height.max(1),
                    imageops::FilterType::Triangle,
                );
            }
            Some(Arc::new(image))
        });
    }

    /// Serializes the committed state. Transient objects are left out and the
    /// remaining z-indices are renumbered densely.
    pub fn capture(&self) -> EngineResult<Snapshot> {
        let mut objects = self
            .objects
            .iter()
            .filter(|object| !object.transient)
            .cloned()
            .collect::<Vec<_>>();
        let mut order = objects
            .iter()
            .enumerate()
            .map(|(index, object)| (object.z_index, index))
            .collect::<Vec<_>>();
        order.sort_unstable();
        for (z, (_, index)) in order.into_iter().enumerate() {
            objects[index].z_index = z;
        }

        let state = SceneState {
            size: self.size,
            background: self.background.clone(),
            objects,
            next_id: self.next_id,
        };
        serde_json::to_string(&state)
            .map(Snapshot::new)
            .map_err(|err| EngineError::Encode {
                message: format!("snapshot serialization failed: {err}"),
            })
    }

    /// Replaces the whole committed state with `snapshot`. Selection and
    /// transient objects are dropped; interaction flags revert to defaults.
    pub fn restore(&mut self, snapshot: &Snapshot) -> EngineResult<()> {
        let state: SceneState =
            serde_json::from_str(snapshot.as_str()).map_err(|err| EngineError::DecodeFailure {
                message: format!("snapshot is malformed: {err}"),
            })?;
        let referenced = state
            .background
            .iter()
            .map(|background| background.bitmap)
            .chain(state.objects.iter().filter_map(|object| match &object.shape {
                Shape::Image { bitmap, .. } => Some(*bitmap),
                _ => None,
            }));
        for bitmap in referenced {
            if self.bitmaps.get(bitmap).is_none() {
                return Err(EngineError::DecodeFailure {
                    message: format!("snapshot references unknown {bitmap}"),
                });
            }
        }

        self.size = state.size;
        self.background = state.background;
        self.objects = state.objects;
        self.next_id = state.next_id;
        self.selection = Selection::None;
        self.reset_interaction_flags();
        self.recompose_background();
        self.emit(SceneEvent::Reloaded);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Color;
    use image::Rgba;

    fn rectangle(x: f32, y: f32) -> VisualObject {
        VisualObject::new(
            Point::new(x, y),
            Shape::Rectangle {
                width: 100.0,
                height: 100.0,
                stroke_width: 0.0,
            },
        )
        .with_fill(Color::new(10, 20, 30))
    }

    fn scene() -> SceneGraph {
        SceneGraph::with_background(RgbaImage::from_pixel(64, 48, Rgba([120, 120, 120, 255])))
    }

    fn z_indices(scene: &SceneGraph) -> Vec<usize> {
        let mut z = scene
            .objects()
            .iter()
            .map(|object| object.z_index)
            .collect::<Vec<_>>();
        z.sort_unstable();
        z
    }

    #[test]
    fn add_object_appends_on_top_and_emits_event() {
        let mut scene = scene();
        let first = scene.add_object(rectangle(0.0, 0.0)).expect("valid rectangle");
        let second = scene.add_object(rectangle(5.0, 5.0)).expect("valid rectangle");

        assert_eq!(scene.object(first).map(|o| o.z_index), Some(0));
        assert_eq!(scene.object(second).map(|o| o.z_index), Some(1));
        assert_ne!(first, second);
        assert_eq!(
            scene.drain_events(),
            vec![SceneEvent::ObjectAdded(first), SceneEvent::ObjectAdded(second)]
        );
    }

    #[test]
    fn add_object_rejects_invalid_geometry_without_mutation() {
        let mut scene = scene();
        let mut bad = rectangle(0.0, 0.0);
        bad.shape = Shape::Ellipse {
            radius_x: -1.0,
            radius_y: 3.0,
        };
        assert!(matches!(
            scene.add_object(bad),
            Err(EngineError::InvalidGeometry { .. })
        ));
        assert_eq!(scene.object_count(), 0);
        assert!(scene.drain_events().is_empty());
    }

    #[test]
    fn remove_object_closes_z_gap_and_ignores_missing_ids() {
        let mut scene = scene();
        let a = scene.add_object(rectangle(0.0, 0.0)).expect("valid");
        let b = scene.add_object(rectangle(1.0, 0.0)).expect("valid");
        let c = scene.add_object(rectangle(2.0, 0.0)).expect("valid");
        scene.drain_events();

        assert!(scene.remove_object(b));
        assert_eq!(z_indices(&scene), vec![0, 1]);
        assert_eq!(scene.object(c).map(|o| o.z_index), Some(1));
        assert_eq!(scene.object(a).map(|o| o.z_index), Some(0));

        assert!(!scene.remove_object(b));
        assert_eq!(scene.drain_events(), vec![SceneEvent::ObjectRemoved(b)]);
    }

    #[test]
    fn set_object_property_reports_missing_object() {
        let mut scene = scene();
        let err = scene
            .set_object_property(ObjectId(99), ObjectProperty::Opacity(0.5))
            .expect_err("missing object should fail");
        assert!(matches!(err, EngineError::ObjectNotFound { id } if id == ObjectId(99)));
    }

    #[test]
    fn set_object_property_validates_before_mutating() {
        let mut scene = scene();
        let id = scene.add_object(rectangle(0.0, 0.0)).expect("valid");
        scene.drain_events();

        let err = scene
            .set_object_property(
                id,
                ObjectProperty::Size {
                    width: 0.0,
                    height: 10.0,
                },
            )
            .expect_err("zero width should fail");
        assert!(matches!(err, EngineError::InvalidGeometry { .. }));
        assert!(matches!(
            scene.object(id).map(|o| &o.shape),
            Some(Shape::Rectangle { width, .. }) if *width == 100.0
        ));
        assert!(scene.drain_events().is_empty());
    }

    #[test]
    fn reorder_swaps_neighbours_and_stops_at_extremes() {
        let mut scene = scene();
        let a = scene.add_object(rectangle(0.0, 0.0)).expect("valid");
        let b = scene.add_object(rectangle(0.0, 0.0)).expect("valid");

        assert!(!scene.reorder(b, ZDirection::Forward));
        assert!(!scene.reorder(a, ZDirection::Backward));
        assert!(scene.reorder(a, ZDirection::Forward));
        assert_eq!(scene.object(a).map(|o| o.z_index), Some(1));
        assert_eq!(scene.object(b).map(|o| o.z_index), Some(0));
    }

    #[test]
    fn selecting_unknown_id_clears_selection() {
        let mut scene = scene();
        let id = scene.add_object(rectangle(0.0, 0.0)).expect("valid");
        scene.set_selection(Some(id));
        assert_eq!(scene.selected(), Some(id));

        scene.set_selection(Some(ObjectId(404)));
        assert_eq!(scene.selected(), None);
    }

    #[test]
    fn selection_changes_are_not_committed_events() {
        let mut scene = scene();
        let id = scene.add_object(rectangle(0.0, 0.0)).expect("valid");
        scene.drain_events();
        scene.set_selection(Some(id));
        let events = scene.drain_events();
        assert_eq!(events, vec![SceneEvent::SelectionChanged(Some(id))]);
        assert!(events.iter().all(|event| !event.is_committed()));
    }

    #[test]
    fn hit_test_returns_topmost_eventable_object() {
        let mut scene = scene();
        let bottom = scene.add_object(rectangle(0.0, 0.0)).expect("valid");
        let top = scene.add_object(rectangle(50.0, 50.0)).expect("valid");

        assert_eq!(scene.hit_test(Point::new(60.0, 60.0)), Some(top));
        assert_eq!(scene.hit_test(Point::new(10.0, 10.0)), Some(bottom));
        assert_eq!(scene.hit_test(Point::new(400.0, 400.0)), None);

        scene.set_interaction_flags(false, false);
        assert_eq!(scene.hit_test(Point::new(60.0, 60.0)), None);
    }

    #[test]
    fn batch_collapses_committed_events() {
        let mut scene = scene();
        scene.begin_batch();
        let id = scene.add_object(rectangle(0.0, 0.0)).expect("valid");
        scene.remove_object(id);
        scene.add_object(rectangle(0.0, 0.0)).expect("valid");
        scene.end_batch("test");
        assert_eq!(scene.drain_events(), vec![SceneEvent::Batch("test")]);

        scene.begin_batch();
        scene.end_batch("empty");
        assert!(scene.drain_events().is_empty());
    }

    #[test]
    fn capture_excludes_transient_objects_and_renumbers_z() {
        let mut scene = scene();
        scene
            .add_transient_object(rectangle(0.0, 0.0))
            .expect("valid");
        let kept = scene.add_object(rectangle(5.0, 5.0)).expect("valid");

        let snapshot = scene.capture().expect("capture");
        let mut restored = scene.clone();
        restored.restore(&snapshot).expect("restore");
        assert_eq!(restored.object_count(), 1);
        assert_eq!(restored.objects().len(), 1);
        assert_eq!(restored.object(kept).map(|o| o.z_index), Some(0));
    }

    #[test]
    fn restore_round_trips_capture() {
        let mut scene = scene();
        let id = scene.add_object(rectangle(3.0, 4.0)).expect("valid");
        scene
            .set_filter_parameter(FilterTarget::Background, FilterKind::Brightness, 0.3)
            .expect("background exists");
        let snapshot = scene.capture().expect("capture");

        scene.remove_object(id);
        scene
            .set_filter_parameter(FilterTarget::Background, FilterKind::Brightness, 0.0)
            .expect("background exists");
        scene.restore(&snapshot).expect("restore");

        assert_eq!(scene.capture().expect("capture"), snapshot);
        assert!(scene.object(id).is_some());
    }

    #[test]
    fn restore_rejects_unknown_bitmap() {
        let donor = scene();
        let snapshot = donor.capture().expect("capture");
        let mut empty = SceneGraph::new(CanvasSize::new(10, 10));
        assert!(matches!(
            empty.restore(&snapshot),
            Err(EngineError::DecodeFailure { .. })
        ));
    }

    #[test]
    fn rotate_background_swaps_canvas_axes() {
        let mut scene = scene();
        assert!(scene.rotate_background());
        assert_eq!(scene.size(), CanvasSize::new(48, 64));
        assert_eq!(
            scene.displayed_background().map(|image| image.dimensions()),
            Some((48, 64))
        );
    }

    #[test]
    fn filters_only_apply_to_images() {
        let mut scene = scene();
        let id = scene.add_object(rectangle(0.0, 0.0)).expect("valid");
        assert!(matches!(
            scene.set_filter_parameter(FilterTarget::Object(id), FilterKind::Blur, 0.5),
            Err(EngineError::InvalidGeometry { .. })
        ));
    }
}
