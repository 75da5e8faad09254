use pdfrelay_core::UserId;

/// Viewer context for a request: who is looking, if anyone.
///
/// Authentication itself is outside this service; upstream infrastructure
/// asserts the viewer identity and this context carries it to the handlers
/// that gate what gets rendered.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ViewerContext {
    viewer: Option<UserId>,
}

impl ViewerContext {
    pub fn anonymous() -> Self {
        Self { viewer: None }
    }

    pub fn new(viewer: UserId) -> Self {
        Self { viewer: Some(viewer) }
    }

    pub fn viewer(&self) -> Option<UserId> {
        self.viewer
    }
}
