/// Mock Viewport for unit tests (no render surface required).
///
/// Records every render and dispose call so scheduler tests can assert
/// exactly how many frame passes reached each attached view.

use super::share_scene::SharedScene;
use super::viewport::Viewport;

pub struct MockViewport {
    name: String,
    /// Number of render calls received
    pub render_count: usize,
    /// Number of dispose calls received
    pub dispose_count: usize,
    /// Pool instance count observed at each render call
    pub seen_instance_counts: Vec<usize>,
}

impl MockViewport {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            render_count: 0,
            dispose_count: 0,
            seen_instance_counts: Vec::new(),
        }
    }
}

impl Viewport for MockViewport {
    fn name(&self) -> &str {
        &self.name
    }

    fn render(&mut self, scene: &SharedScene) {
        self.render_count += 1;
        self.seen_instance_counts.push(scene.boxes().instance_count());
    }

    fn dispose(&mut self) {
        self.dispose_count += 1;
    }
}
