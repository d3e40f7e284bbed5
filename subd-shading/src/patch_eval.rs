//! # Limit Surface Patch Evaluation
//!
//! Attributes flagged [`SUBDIVIDED`](crate::AttributeFlags::SUBDIVIDED) are
//! defined on the limit surface rather than on the tessellated mesh. They are
//! evaluated by a [`PatchEvaluator`] at the patch parameter location of the
//! shading point.
//!
//! Production renderers back this with a patch table built from the
//! subdivision refiner (bicubic B-spline and Gregory patches).
//! [`BilinearPatchEvaluator`] is the exact limit of the *bilinear* scheme and
//! is useful for meshes subdivided with that scheme and for testing.
use crate::{
    math::{Float2, Quad},
    Attribute, AttributeBuffers, SubdMesh,
};

/// Value and first partial derivatives of an attribute at a patch location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatchSample<T> {
    pub value: T,
    /// Derivative with respect to the patch `s` coordinate.
    pub dads: T,
    /// Derivative with respect to the patch `t` coordinate.
    pub dadt: T,
}

impl<T: Attribute> PatchSample<T> {
    #[inline]
    pub fn zero() -> Self {
        Self {
            value: T::zero(),
            dads: T::zero(),
            dadt: T::zero(),
        }
    }
}

/// Evaluates attributes on the limit surface of a patch.
///
/// Implementations are called from many threads at once and must not block.
pub trait PatchEvaluator: Sync {
    /// Evaluates the attribute stored at `offset` on `patch` (word offset into
    /// the patch directory) at parameter location `(s, t)`.
    ///
    /// `rgba` is set for attributes authored as byte colors.
    fn eval<T: Attribute>(
        &self,
        offset: u32,
        patch: usize,
        s: f32,
        t: f32,
        rgba: bool,
    ) -> PatchSample<T>;
}

/// Evaluator for scenes without limit surface data. Always returns zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPatchEval;

impl PatchEvaluator for NoPatchEval {
    #[inline]
    fn eval<T: Attribute>(&self, _: u32, _: usize, _: f32, _: f32, _: bool) -> PatchSample<T> {
        PatchSample::zero()
    }
}

/// Limit evaluator for the bilinear scheme.
///
/// The limit surface of bilinear subdivision is the bilinear interpolation
/// of each patch's control vertices, so values are read from the vertex
/// keyed attribute arrays.
#[derive(Debug, Clone, Copy)]
pub struct BilinearPatchEvaluator<'a> {
    mesh: SubdMesh<'a>,
    buffers: AttributeBuffers<'a>,
}

impl<'a> BilinearPatchEvaluator<'a> {
    pub fn new(mesh: SubdMesh<'a>, buffers: AttributeBuffers<'a>) -> Self {
        Self { mesh, buffers }
    }
}

impl PatchEvaluator for BilinearPatchEvaluator<'_> {
    fn eval<T: Attribute>(
        &self,
        offset: u32,
        patch: usize,
        s: f32,
        t: f32,
        rgba: bool,
    ) -> PatchSample<T> {
        let offset = offset as usize;
        let quad = Quad(self.mesh.patch_indices(patch).map(|v| {
            if rgba {
                self.buffers.fetch_byte_color::<T>(offset + v as usize)
            } else {
                self.buffers.fetch::<T>(offset + v as usize)
            }
        }));

        let quad = if self.mesh.patch_corners_len(patch) != 4 {
            quad.ngon_midpoints()
        } else {
            quad
        };

        let p = Float2::new(s, t);
        let (dads, dadt) = quad.partials(p);

        PatchSample {
            value: quad.at(p),
            dads,
            dadt,
        }
    }
}
