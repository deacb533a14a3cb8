use std::fmt;

/// Aspect ratio used when an item cannot supply usable dimensions.
pub const FALLBACK_ASPECT_RATIO: f32 = 1.0;

/// Opaque identifier handed to us by whoever owns the item list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Natural size state of an item.
///
/// Dimensions usually arrive asynchronously (an image finishes loading), so an
/// item starts `Pending` and later becomes `Known` or `Failed`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dimensions {
    Pending,
    Known { width: f32, height: f32 },
    Failed,
}

impl Dimensions {
    /// Width / height, or `None` when the pair is unusable.
    pub fn ratio(&self) -> Option<f32> {
        match *self {
            Dimensions::Known { width, height } => {
                let ar = width / height;
                if width > 0.0 && height > 0.0 && ar.is_finite() && ar > 0.0 {
                    Some(ar)
                } else {
                    None
                }
            }
            Dimensions::Pending | Dimensions::Failed => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GalleryItem {
    pub id: ItemId,
    pub dimensions: Dimensions,
}

impl GalleryItem {
    /// Create an item with known natural dimensions.
    pub fn new(id: ItemId, natural_width: f32, natural_height: f32) -> Self {
        Self {
            id,
            dimensions: Dimensions::Known {
                width: natural_width,
                height: natural_height,
            },
        }
    }

    /// Create an item whose dimensions are still loading.
    pub fn pending(id: ItemId) -> Self {
        Self {
            id,
            dimensions: Dimensions::Pending,
        }
    }

    /// Natural width / height, substituting a square for anything unusable.
    pub fn aspect_ratio(&self) -> f32 {
        self.dimensions.ratio().unwrap_or(FALLBACK_ASPECT_RATIO)
    }

    /// True once a load attempt has finished, successfully or not.
    pub fn is_resolved(&self) -> bool {
        !matches!(self.dimensions, Dimensions::Pending)
    }

    pub fn natural_size(&self) -> Option<(f32, f32)> {
        match self.dimensions {
            Dimensions::Known { width, height } => Some((width, height)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aspect_ratio_known() {
        let item = GalleryItem::new(ItemId(1), 1600.0, 900.0);
        assert!((item.aspect_ratio() - 16.0 / 9.0).abs() < 1e-6);
        assert!(item.is_resolved());
    }

    #[test]
    fn test_aspect_ratio_fallbacks() {
        let zero_height = GalleryItem::new(ItemId(1), 100.0, 0.0);
        let zero_width = GalleryItem::new(ItemId(2), 0.0, 100.0);
        let nan = GalleryItem::new(ItemId(3), f32::NAN, 100.0);
        let inf = GalleryItem::new(ItemId(4), f32::INFINITY, 100.0);
        let pending = GalleryItem::pending(ItemId(5));

        for item in [zero_height, zero_width, nan, inf, pending] {
            assert_eq!(item.aspect_ratio(), FALLBACK_ASPECT_RATIO, "{:?}", item);
        }
    }

    #[test]
    fn test_pending_is_unresolved() {
        let mut item = GalleryItem::pending(ItemId(9));
        assert!(!item.is_resolved());
        item.dimensions = Dimensions::Failed;
        assert!(item.is_resolved());
        assert_eq!(item.natural_size(), None);
    }
}
