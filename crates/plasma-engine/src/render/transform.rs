use glam::Mat4;

use super::cmd::StackKind;

/// Object, view and projection stacks plus the derived world stack.
///
/// Every object or view push adds one world entry (`view_top * object_top`)
/// and every pop removes one. Empty stacks read as identity.
#[derive(Debug, Clone, Default)]
pub struct TransformStacks {
    object: Vec<Mat4>,
    view: Vec<Mat4>,
    projection: Vec<Mat4>,
    world: Vec<Mat4>,
}

impl TransformStacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// `replace = false` composes as `top * m`; `replace = true` discards the current top.
    pub fn push(&mut self, kind: StackKind, m: Mat4, replace: bool) {
        let stack = self.stack_mut(kind);
        let top = if replace {
            m
        } else {
            stack.last().copied().unwrap_or(Mat4::IDENTITY) * m
        };
        stack.push(top);

        if kind != StackKind::Projection {
            let world = self.compose_world();
            self.world.push(world);
        }
    }

    /// Pops up to `count` entries; popping an empty stack does nothing.
    pub fn pop(&mut self, kind: StackKind, count: usize) {
        let stack = self.stack_mut(kind);
        let n = count.min(stack.len());
        stack.truncate(stack.len() - n);

        if kind != StackKind::Projection {
            let keep = self.world.len().saturating_sub(n);
            self.world.truncate(keep);
            // Interleaved object/view pushes leave a stale top behind.
            let world = self.compose_world();
            if let Some(top) = self.world.last_mut() {
                *top = world;
            }
        }
    }

    #[inline]
    pub fn top(&self, kind: StackKind) -> Mat4 {
        self.stack(kind).last().copied().unwrap_or(Mat4::IDENTITY)
    }

    #[inline]
    pub fn world_top(&self) -> Mat4 {
        self.world.last().copied().unwrap_or(Mat4::IDENTITY)
    }

    #[inline]
    pub fn projection_top(&self) -> Mat4 {
        self.top(StackKind::Projection)
    }

    #[inline]
    pub fn depth(&self, kind: StackKind) -> usize {
        self.stack(kind).len()
    }

    #[inline]
    pub fn world_depth(&self) -> usize {
        self.world.len()
    }

    pub fn clear(&mut self) {
        self.object.clear();
        self.view.clear();
        self.projection.clear();
        self.world.clear();
    }

    fn compose_world(&self) -> Mat4 {
        self.top(StackKind::View) * self.top(StackKind::Object)
    }

    fn stack(&self, kind: StackKind) -> &Vec<Mat4> {
        match kind {
            StackKind::Object => &self.object,
            StackKind::View => &self.view,
            StackKind::Projection => &self.projection,
        }
    }

    fn stack_mut(&mut self, kind: StackKind) -> &mut Vec<Mat4> {
        match kind {
            StackKind::Object => &mut self.object,
            StackKind::View => &mut self.view,
            StackKind::Projection => &mut self.projection,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn a() -> Mat4 {
        Mat4::from_translation(Vec3::new(1.0, 2.0, 0.0))
    }

    fn b() -> Mat4 {
        Mat4::from_scale(Vec3::new(2.0, 3.0, 1.0))
    }

    // ── composition ──

    #[test]
    fn object_pushes_compose_in_order() {
        let mut t = TransformStacks::new();
        let view = Mat4::from_rotation_z(0.5);
        t.push(StackKind::View, view, false);
        t.push(StackKind::Object, a(), false);
        t.push(StackKind::Object, b(), false);

        assert!(t.world_top().abs_diff_eq(view * (a() * b()), 1e-6));
        assert_eq!(t.world_depth(), 3);
    }

    #[test]
    fn replace_discards_top() {
        let mut t = TransformStacks::new();
        t.push(StackKind::Object, a(), false);
        t.push(StackKind::Object, b(), true);
        assert_eq!(t.top(StackKind::Object), b());
    }

    #[test]
    fn projection_does_not_touch_world() {
        let mut t = TransformStacks::new();
        t.push(StackKind::Projection, Mat4::orthographic_rh(0.0, 1.0, 1.0, 0.0, -1.0, 1.0), false);
        assert_eq!(t.world_depth(), 0);
        assert_eq!(t.world_top(), Mat4::IDENTITY);
    }

    // ── pop ──

    #[test]
    fn pop_removes_latest_world_entry() {
        let mut t = TransformStacks::new();
        t.push(StackKind::Object, a(), false);
        t.push(StackKind::Object, b(), false);
        t.pop(StackKind::Object, 1);
        assert_eq!(t.world_depth(), 1);
        assert!(t.world_top().abs_diff_eq(a(), 1e-6));
    }

    #[test]
    fn pop_never_underflows() {
        let mut t = TransformStacks::new();
        t.push(StackKind::View, a(), false);
        t.pop(StackKind::View, 10);
        t.pop(StackKind::Object, 3);
        t.pop(StackKind::Projection, 1);
        assert_eq!(t.depth(StackKind::View), 0);
        assert_eq!(t.world_depth(), 0);
        assert_eq!(t.world_top(), Mat4::IDENTITY);
    }

    #[test]
    fn interleaved_pop_recomputes_world() {
        let mut t = TransformStacks::new();
        t.push(StackKind::Object, a(), false);
        t.push(StackKind::View, b(), false);
        t.pop(StackKind::Object, 1);
        assert!(t.world_top().abs_diff_eq(b(), 1e-6));
    }

    #[test]
    fn clear_resets_everything() {
        let mut t = TransformStacks::new();
        t.push(StackKind::Object, a(), false);
        t.push(StackKind::Projection, b(), false);
        t.clear();
        assert_eq!(t.world_top(), Mat4::IDENTITY);
        assert_eq!(t.projection_top(), Mat4::IDENTITY);
    }
}
