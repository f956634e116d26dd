/// Lifecycle of the editing session around its scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No file loaded; pointer input is dropped.
    #[default]
    Empty,
    /// Initial decode or first rasterisation in flight.
    Loading,
    Ready,
    /// Page rasterisation in flight; the outgoing scene is kept until it lands.
    SwitchingPage,
}

impl SessionState {
    /// Whether committing edits may be applied to the live scene.
    pub const fn accepts_edits(self) -> bool {
        matches!(self, Self::Ready)
    }
}
