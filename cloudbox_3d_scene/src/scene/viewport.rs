/// Viewport seam: the render-surface collaborator contract.
///
/// A viewport is an independent camera plus drawing surface observing the
/// shared scene. The coordinator calls `render` during its coalesced frame
/// pass and `dispose` when it shuts down; it implements neither. Viewports
/// read scene state (instances, selection, point cloud) through the
/// reference handed to `render` and the pool's query methods: they never
/// mutate the shared scene directly.

use super::share_scene::SharedScene;

/// Render-surface contract implemented by embedders.
pub trait Viewport: Send {
    /// Viewport name, for logging and debugging
    fn name(&self) -> &str;

    /// Draw the current scene state.
    ///
    /// Called once per coalesced frame pass, in attachment order. Must not
    /// re-enter the coordinator's mutation API.
    fn render(&mut self, scene: &SharedScene);

    /// Release the viewport's drawing surface.
    ///
    /// Called by [`SharedScene::dispose`] for every attached viewport.
    fn dispose(&mut self);
}
