//! Submission Filters
//!
//! Filters decide, at submission time, whether a renderable is worth
//! queueing at all. The frustum filter is the canonical one: it rejects a
//! renderable iff its AABB lies entirely behind one of the view frustum's
//! planes.

use std::cell::Cell;
use std::rc::Rc;

use glam::{Mat4, Vec3, Vec4, Vec4Swizzles};

use super::renderable::Renderable3D;

/// Accept/reject check applied when a renderable is submitted.
pub trait Filter {
    fn should_be_rendered(&self, renderable: &dyn Renderable3D) -> bool;
}

/// Shared filter handle; renderers hold filters by identity so they can be
/// removed again.
pub type SharedFilter = Rc<dyn Filter>;

/// Frustum culling against a view-projection matrix.
///
/// The planes are refreshed once per frame by the camera system while
/// renderers keep the filter installed, hence the interior mutability.
pub struct FrustumFilter {
    planes: Cell<[Vec4; 6]>,
}

impl Default for FrustumFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl FrustumFilter {
    /// A filter that accepts everything until the first update.
    #[must_use]
    pub fn new() -> Self {
        Self {
            planes: Cell::new([Vec4::ZERO; 6]),
        }
    }

    /// Re-derives the six planes from a view-projection matrix.
    ///
    /// Left/right from rows 3 ± 0, bottom/top from rows 3 ± 1, near/far
    /// from rows 3 ± 2, each normalised by its xyz length.
    pub fn update_frustum(&self, view_projection: Mat4) {
        let row = |i: usize| view_projection.row(i);
        let mut planes = [
            row(3) + row(0),
            row(3) - row(0),
            row(3) + row(1),
            row(3) - row(1),
            row(3) + row(2),
            row(3) - row(2),
        ];
        for plane in &mut planes {
            let normal = plane.xyz();
            let inv_len = normal.length_recip();
            if inv_len.is_finite() {
                *plane *= inv_len;
            }
        }
        self.planes.set(planes);
    }

    #[must_use]
    pub fn planes(&self) -> [Vec4; 6] {
        self.planes.get()
    }

    fn updated(&self) -> bool {
        self.planes.get() != [Vec4::ZERO; 6]
    }
}

impl Filter for FrustumFilter {
    fn should_be_rendered(&self, renderable: &dyn Renderable3D) -> bool {
        if !self.updated() {
            return true;
        }
        let (min, max) = renderable.bounds();

        for plane in self.planes.get() {
            // The AABB positive vertex: the corner furthest along the plane
            // normal. If even that corner is behind the plane, the whole
            // box is.
            let positive = Vec3::new(
                if plane.x < 0.0 { min.x } else { max.x },
                if plane.y < 0.0 { min.y } else { max.y },
                if plane.z < 0.0 { min.z } else { max.z },
            );
            if plane.xyz().dot(positive) + plane.w < 0.0 {
                return false;
            }
        }
        true
    }
}
