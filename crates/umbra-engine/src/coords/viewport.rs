/// Drawable size in physical pixels.
///
/// The accumulation target is allocated at this size, capped at the device
/// texture limit.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Each side clamped into `1..=max`, for device texture limits.
    #[inline]
    pub fn clamped_to(self, max: u32) -> Self {
        let max = max.max(1);
        Self::new(self.width.clamp(1, max), self.height.clamp(1, max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamped_to_caps_each_side() {
        let size = Viewport::new(10_000, 300).clamped_to(8192);
        assert_eq!(size, Viewport::new(8192, 300));
    }

    #[test]
    fn clamped_to_raises_zero_sides() {
        assert_eq!(Viewport::new(0, 0).clamped_to(2048), Viewport::new(1, 1));
    }
}
