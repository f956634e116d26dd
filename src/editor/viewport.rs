use crate::geometry::Point;

const ZOOM_MIN_PERCENT: u16 = 10;
const ZOOM_MAX_PERCENT: u16 = 800;
const ZOOM_LEVELS_PERCENT: &[u16] = &[
    10, 12, 16, 20, 25, 33, 50, 67, 75, 80, 90, 100, 110, 125, 150, 175, 200, 250, 300, 400, 500,
    600, 800,
];
const PAN_STEP_PX: i32 = 48;

fn clamp_zoom_percent(zoom_percent: u16) -> u16 {
    zoom_percent.clamp(ZOOM_MIN_PERCENT, ZOOM_MAX_PERCENT)
}

fn next_zoom_in_level(current_zoom_percent: u16) -> u16 {
    ZOOM_LEVELS_PERCENT
        .iter()
        .copied()
        .find(|level| *level > current_zoom_percent)
        .unwrap_or(ZOOM_MAX_PERCENT)
}

fn next_zoom_out_level(current_zoom_percent: u16) -> u16 {
    ZOOM_LEVELS_PERCENT
        .iter()
        .rev()
        .copied()
        .find(|level| *level < current_zoom_percent)
        .unwrap_or(ZOOM_MIN_PERCENT)
}

/// Interactive zoom and pan. A pure view transform: it never changes the
/// scene or the exported pixel dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    zoom_percent: u16,
    pan_x: i32,
    pan_y: i32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new()
    }
}

impl Viewport {
    pub const fn new() -> Self {
        Self {
            zoom_percent: 100,
            pan_x: 0,
            pan_y: 0,
        }
    }

    pub const fn zoom_percent(&self) -> u16 {
        self.zoom_percent
    }

    pub fn zoom_factor(&self) -> f32 {
        f32::from(self.zoom_percent) / 100.0
    }

    pub const fn pan(&self) -> (i32, i32) {
        (self.pan_x, self.pan_y)
    }

    pub fn zoom_in(&mut self) {
        self.zoom_percent = next_zoom_in_level(clamp_zoom_percent(self.zoom_percent));
    }

    pub fn zoom_out(&mut self) {
        self.zoom_percent = next_zoom_out_level(clamp_zoom_percent(self.zoom_percent));
    }

    pub fn set_zoom_percent(&mut self, zoom_percent: u16) {
        self.zoom_percent = clamp_zoom_percent(zoom_percent);
    }

    pub fn set_actual_size(&mut self) {
        self.zoom_percent = 100;
        self.pan_x = 0;
        self.pan_y = 0;
    }

    pub fn pan_by(&mut self, delta_x: i32, delta_y: i32) {
        self.pan_x = self.pan_x.saturating_add(delta_x);
        self.pan_y = self.pan_y.saturating_add(delta_y);
    }

    pub fn pan_left(&mut self) {
        self.pan_by(-PAN_STEP_PX, 0);
    }

    pub fn pan_right(&mut self) {
        self.pan_by(PAN_STEP_PX, 0);
    }

    /// Maps a point in view space (widget pixels) into canvas space.
    pub fn to_canvas(&self, view: Point) -> Point {
        let zoom = self.zoom_factor();
        Point::new(
            (view.x - self.pan_x as f32) / zoom,
            (view.y - self.pan_y as f32) / zoom,
        )
    }

    pub fn to_view(&self, canvas: Point) -> Point {
        let zoom = self.zoom_factor();
        Point::new(
            canvas.x * zoom + self.pan_x as f32,
            canvas.y * zoom + self.pan_y as f32,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zoom_steps_through_levels_and_clamps() {
        let mut viewport = Viewport::new();
        viewport.zoom_in();
        assert_eq!(viewport.zoom_percent(), 110);
        viewport.zoom_out();
        viewport.zoom_out();
        assert_eq!(viewport.zoom_percent(), 90);

        viewport.set_zoom_percent(5000);
        assert_eq!(viewport.zoom_percent(), ZOOM_MAX_PERCENT);
        viewport.zoom_in();
        assert_eq!(viewport.zoom_percent(), ZOOM_MAX_PERCENT);
    }

    #[test]
    fn view_and_canvas_mapping_round_trip() {
        let mut viewport = Viewport::new();
        viewport.set_zoom_percent(200);
        viewport.pan_by(10, -20);
        let canvas = viewport.to_canvas(Point::new(110.0, 80.0));
        assert_eq!(canvas, Point::new(50.0, 50.0));
        assert_eq!(viewport.to_view(canvas), Point::new(110.0, 80.0));
    }

    #[test]
    fn actual_size_resets_pan() {
        let mut viewport = Viewport::new();
        viewport.pan_right();
        viewport.set_zoom_percent(300);
        viewport.set_actual_size();
        assert_eq!(viewport, Viewport::new());
    }
}
