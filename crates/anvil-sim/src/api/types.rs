use glam::Vec2;

/// Stable identifier for every body the simulation creates.
/// Stored in the rigid body's `user_data` so collision events can be matched by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum BodyId {
    Handle = 1,
    Head,
    Anvil,
    WallTop,
    WallBottom,
    WallLeft,
    WallRight,
    /// Invisible fixed body the centre tether hangs from.
    TetherAnchor,
    /// Invisible kinematic body that follows the pointer while dragging.
    DragAnchor,
}

impl BodyId {
    pub const ALL: [BodyId; 9] = [
        Self::Handle, Self::Head, Self::Anvil,
        Self::WallTop, Self::WallBottom, Self::WallLeft, Self::WallRight,
        Self::TetherAnchor, Self::DragAnchor,
    ];

    pub fn raw(self) -> u128 {
        self as u32 as u128
    }

    /// Resolve a `user_data` value back into an id. Unknown values yield `None`.
    pub fn from_raw(raw: u128) -> Option<Self> {
        Self::ALL.iter().copied().find(|id| id.raw() == raw)
    }

    /// The two bodies the user can swing.
    pub fn is_hammer(self) -> bool {
        matches!(self, Self::Handle | Self::Head)
    }
}

/// Logical size of the canvas the scene is laid out in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    /// Used when the mount element reports a non-positive size.
    pub const FALLBACK: Viewport = Viewport { width: 400.0, height: 300.0 };

    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Build a viewport from a measured bounding box, falling back to
    /// [`Viewport::FALLBACK`] when either side is non-positive or not a number.
    pub fn measured(width: f32, height: f32) -> Self {
        if width > 0.0 && height > 0.0 && width.is_finite() && height.is_finite() {
            Self { width, height }
        } else {
            log::error!(
                "invalid canvas dimensions {}x{}, using {}x{}",
                width, height, Self::FALLBACK.width, Self::FALLBACK.height
            );
            Self::FALLBACK
        }
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Whether `p` lies inside the viewport grown by `margin` on every side.
    pub fn contains_with_margin(&self, p: Vec2, margin: f32) -> bool {
        p.x >= -margin
            && p.x <= self.width + margin
            && p.y >= -margin
            && p.y <= self.height + margin
    }
}

/// Placement of the canvas on the page, refreshed by the host every frame.
/// Global sparks live in page (client) coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageFrame {
    /// Top-left corner of the canvas in page coordinates.
    pub canvas_origin: Vec2,
    /// Size of the full page viewport the overlay covers.
    pub viewport: Vec2,
}

impl PageFrame {
    pub fn new(canvas_origin: Vec2, viewport: Vec2) -> Self {
        Self { canvas_origin, viewport }
    }

    /// A page that is exactly the canvas, anchored at the origin.
    pub fn from_viewport(viewport: Viewport) -> Self {
        Self { canvas_origin: Vec2::ZERO, viewport: viewport.size() }
    }

    pub fn to_page(&self, canvas_point: Vec2) -> Vec2 {
        self.canvas_origin + canvas_point
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_id_roundtrips_through_user_data() {
        for id in BodyId::ALL {
            assert_eq!(BodyId::from_raw(id.raw()), Some(id));
        }
        assert_eq!(BodyId::from_raw(0), None);
        assert_eq!(BodyId::from_raw(999), None);
    }

    #[test]
    fn zero_sized_canvas_falls_back() {
        assert_eq!(Viewport::measured(0.0, 0.0), Viewport::FALLBACK);
        assert_eq!(Viewport::measured(-5.0, 200.0), Viewport::FALLBACK);
        assert_eq!(Viewport::measured(f32::NAN, 200.0), Viewport::FALLBACK);
        assert_eq!(Viewport::measured(640.0, 480.0), Viewport::new(640.0, 480.0));
    }

    #[test]
    fn margin_containment() {
        let vp = Viewport::new(400.0, 300.0);
        assert!(vp.contains_with_margin(Vec2::new(-49.0, 10.0), 50.0));
        assert!(!vp.contains_with_margin(Vec2::new(-51.0, 10.0), 50.0));
        assert!(!vp.contains_with_margin(Vec2::new(10.0, 351.0), 50.0));
    }

    #[test]
    fn page_frame_translates() {
        let page = PageFrame::new(Vec2::new(100.0, 40.0), Vec2::new(1280.0, 720.0));
        assert_eq!(page.to_page(Vec2::new(5.0, 6.0)), Vec2::new(105.0, 46.0));
    }
}
