//! # Attribute Evaluation on Subdivision Triangles
//!
//! A triangle produced by tessellating a subdivision patch does not carry the
//! attributes of the patch. [`SubdAttributeEvaluator`] reconstructs them at a
//! hit point `(prim, u, v)`:
//!
//! 1. The three triangle vertices know their `(s, t)` location inside the
//!    patch. Barycentrics `(u, v)` map to a patch location through them.
//! 2. The attribute is read at the patch corners (or evaluated on the limit
//!    surface) and interpolated at that location.
//! 3. Ray differentials `du`, `dv` are carried through both maps to give the
//!    screen-space derivatives `dfdx`, `dfdy` needed for filtered texture
//!    lookups.
//!
//! Evaluation is a pure function of its borrowed inputs. It never allocates,
//! locks or fails; the evaluator can be shared between any number of
//! threads.
//!
//! ## Example
//! ```
//! use subd_shading::*;
//!
//! let records = [PatchRecord::quad([0, 1, 2, 3], 0, 0)];
//! let uv = [Float2::new(0.0, 0.0), Float2::new(1.0, 0.0), Float2::new(0.0, 1.0)];
//! let mesh = SubdMesh::new(PatchRecord::words(&records), &[0], &[[0, 1, 2]], &uv).unwrap();
//!
//! let values = [1.0, 2.0, 3.0, 4.0];
//! let buffers = AttributeBuffers {
//!     float: &values,
//!     ..Default::default()
//! };
//!
//! let evaluator = SubdAttributeEvaluator::new(mesh, buffers);
//! let desc = AttributeDescriptor::new(AttributeElement::Vertex, 0, AttributeType::Float);
//! let sample = ShaderSample::new(0, 0.5, 0.5);
//!
//! assert_eq!(evaluator.evaluate::<f32>(&sample, &desc), 3.0);
//! ```
use crate::{
    math::{Differential, Float2, Quad},
    Attribute, AttributeBuffers, AttributeDescriptor, AttributeElement, AttributeType,
    NoPatchEval, PatchEvaluator, SubdMesh,
};

/// A ray hit on a tessellated triangle.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ShaderSample {
    /// Triangle primitive index.
    pub prim: usize,
    /// Barycentric weight of the second triangle vertex.
    pub u: f32,
    /// Barycentric weight of the third triangle vertex.
    pub v: f32,
    /// Screen-space partials of `u`.
    pub du: Differential,
    /// Screen-space partials of `v`.
    pub dv: Differential,
}

impl ShaderSample {
    /// A sample without ray differentials.
    #[inline]
    pub fn new(prim: usize, u: f32, v: f32) -> Self {
        Self {
            prim,
            u,
            v,
            du: Differential::ZERO,
            dv: Differential::ZERO,
        }
    }

    #[inline]
    pub fn with_differentials(mut self, du: Differential, dv: Differential) -> Self {
        self.du = du;
        self.dv = dv;
        self
    }
}

/// Which screen-space derivatives to compute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DerivativeRequest {
    pub dx: bool,
    pub dy: bool,
}

impl DerivativeRequest {
    pub const NONE: DerivativeRequest = DerivativeRequest {
        dx: false,
        dy: false,
    };
    pub const DX: DerivativeRequest = DerivativeRequest {
        dx: true,
        dy: false,
    };
    pub const DY: DerivativeRequest = DerivativeRequest {
        dx: false,
        dy: true,
    };
    pub const BOTH: DerivativeRequest = DerivativeRequest { dx: true, dy: true };

    #[inline]
    pub fn any(self) -> bool {
        self.dx || self.dy
    }
}

/// An evaluated attribute. Derivatives are `Some` exactly when requested.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluated<T> {
    pub value: T,
    pub dfdx: Option<T>,
    pub dfdy: Option<T>,
}

impl<T: Attribute> Evaluated<T> {
    /// A value that does not vary across the triangle.
    #[inline]
    fn constant(value: T, request: DerivativeRequest) -> Self {
        Self {
            value,
            dfdx: request.dx.then(T::zero),
            dfdy: request.dy.then(T::zero),
        }
    }
}

/// Derivative of a value interpolated from the three triangle vertex values
/// `a`, `b`, `c` with respect to screen `x`.
#[inline]
pub fn triangle_attribute_dfdx<T: Attribute>(
    du: Differential,
    dv: Differential,
    a: T,
    b: T,
    c: T,
) -> T {
    b * du.dx + c * dv.dx - a * (du.dx + dv.dx)
}

/// Derivative of a value interpolated from the three triangle vertex values
/// `a`, `b`, `c` with respect to screen `y`.
#[inline]
pub fn triangle_attribute_dfdy<T: Attribute>(
    du: Differential,
    dv: Differential,
    a: T,
    b: T,
    c: T,
) -> T {
    b * du.dy + c * dv.dy - a * (du.dy + dv.dy)
}

/// Chains screen-space barycentric partials through the triangle's patch
/// parameterization `(dpdu, dpdv)` and the patch-space partials
/// `(dads, dadt)` of an attribute.
///
/// Each derivative is only computed when requested.
#[inline]
pub fn patch_attribute_df<T: Attribute>(
    du: Differential,
    dv: Differential,
    dads: T,
    dadt: T,
    dpdu: Float2,
    dpdv: Float2,
    request: DerivativeRequest,
) -> (Option<T>, Option<T>) {
    let dfdx = request.dx.then(|| {
        let dsdx = dpdu.x * du.dx + dpdv.x * dv.dx;
        let dtdx = dpdu.y * du.dx + dpdv.y * dv.dx;
        dads * dsdx + dadt * dtdx
    });
    let dfdy = request.dy.then(|| {
        let dsdy = dpdu.x * du.dy + dpdv.x * dv.dy;
        let dtdy = dpdu.y * du.dy + dpdv.y * dv.dy;
        dads * dsdy + dadt * dtdy
    });
    (dfdx, dfdy)
}

/// Evaluates attributes on triangles tessellated from subdivision patches.
///
/// Holds borrowed views only; copying or sharing it across threads is cheap.
#[derive(Debug, Clone, Copy)]
pub struct SubdAttributeEvaluator<'a, E = NoPatchEval> {
    mesh: SubdMesh<'a>,
    buffers: AttributeBuffers<'a>,
    patch_eval: E,
}

impl<'a> SubdAttributeEvaluator<'a, NoPatchEval> {
    /// An evaluator without limit surface data.
    #[inline]
    pub fn new(mesh: SubdMesh<'a>, buffers: AttributeBuffers<'a>) -> Self {
        Self {
            mesh,
            buffers,
            patch_eval: NoPatchEval,
        }
    }
}

impl<'a, E: PatchEvaluator> SubdAttributeEvaluator<'a, E> {
    /// An evaluator that hands subdivided attributes to `patch_eval`.
    #[inline]
    pub fn with_patch_evaluator(
        mesh: SubdMesh<'a>,
        buffers: AttributeBuffers<'a>,
        patch_eval: E,
    ) -> Self {
        Self {
            mesh,
            buffers,
            patch_eval,
        }
    }

    #[inline]
    pub fn mesh(&self) -> &SubdMesh<'a> {
        &self.mesh
    }

    #[inline]
    pub fn buffers(&self) -> &AttributeBuffers<'a> {
        &self.buffers
    }

    /// Returns the attribute value at `sample`.
    #[inline]
    pub fn evaluate<T: Attribute>(&self, sample: &ShaderSample, desc: &AttributeDescriptor) -> T {
        self.evaluate_with_derivatives(sample, desc, DerivativeRequest::NONE).value
    }

    /// Returns the attribute value at `sample` together with the requested
    /// screen-space derivatives.
    pub fn evaluate_with_derivatives<T: Attribute>(
        &self,
        sample: &ShaderSample,
        desc: &AttributeDescriptor,
        request: DerivativeRequest,
    ) -> Evaluated<T> {
        let patch = self.mesh.patch_of(sample.prim);

        if cfg!(feature = "patch_eval") && desc.is_subdivided() {
            return self.eval_limit(sample, desc, patch, request);
        }

        let offset = desc.offset as usize;

        match desc.element {
            AttributeElement::Face => Evaluated::constant(
                self.buffers.fetch::<T>(offset + self.mesh.patch_face(patch) as usize),
                request,
            ),
            AttributeElement::Vertex | AttributeElement::VertexMotion => {
                let quad = Quad(
                    self.mesh
                        .patch_indices(patch)
                        .map(|v| self.buffers.fetch::<T>(offset + v as usize)),
                );
                self.interpolate(sample, patch, quad, request)
            }
            AttributeElement::Corner => {
                let quad = Quad(
                    self.mesh
                        .patch_corners(patch)
                        .map(|c| self.buffers.fetch::<T>(offset + c as usize)),
                );
                self.interpolate(sample, patch, quad, request)
            }
            AttributeElement::CornerByte => {
                let quad = Quad(
                    self.mesh
                        .patch_corners(patch)
                        .map(|c| self.buffers.fetch_byte_color::<T>(offset + c as usize)),
                );
                self.interpolate(sample, patch, quad, request)
            }
            _ => Evaluated::constant(T::zero(), request),
        }
    }

    /// Interpolates the patch corner values at the triangle vertices, then
    /// across the triangle.
    #[inline]
    fn interpolate<T: Attribute>(
        &self,
        sample: &ShaderSample,
        patch: usize,
        quad: Quad<T>,
        request: DerivativeRequest,
    ) -> Evaluated<T> {
        let uv = self.mesh.patch_uv(sample.prim);

        let quad = if self.mesh.patch_corners_len(patch) != 4 {
            quad.ngon_midpoints()
        } else {
            quad
        };

        let a = quad.at(uv[0]);
        let b = quad.at(uv[1]);
        let c = quad.at(uv[2]);

        let differentials = cfg!(feature = "ray_differentials");

        Evaluated {
            value: b * sample.u + c * sample.v + a * (1.0 - sample.u - sample.v),
            dfdx: request.dx.then(|| {
                if differentials {
                    triangle_attribute_dfdx(sample.du, sample.dv, a, b, c)
                } else {
                    T::zero()
                }
            }),
            dfdy: request.dy.then(|| {
                if differentials {
                    triangle_attribute_dfdy(sample.du, sample.dv, a, b, c)
                } else {
                    T::zero()
                }
            }),
        }
    }

    /// Evaluates the attribute on the limit surface.
    ///
    /// The triangle's patch parameterization is taken to be affine, which
    /// holds for triangles cut from a single quad patch.
    fn eval_limit<T: Attribute>(
        &self,
        sample: &ShaderSample,
        desc: &AttributeDescriptor,
        patch: usize,
        request: DerivativeRequest,
    ) -> Evaluated<T> {
        let uv = self.mesh.patch_uv(sample.prim);

        let dpdu = uv[1] - uv[0];
        let dpdv = uv[2] - uv[0];

        // [s, t]
        let p = dpdu * sample.u + dpdv * sample.v + uv[0];

        let limit = self.patch_eval.eval::<T>(
            desc.offset,
            patch,
            p.x,
            p.y,
            desc.ty == AttributeType::Rgba,
        );

        let (dfdx, dfdy) = if cfg!(feature = "ray_differentials") {
            patch_attribute_df(
                sample.du,
                sample.dv,
                limit.dads,
                limit.dadt,
                dpdu,
                dpdv,
                request,
            )
        } else {
            (request.dx.then(T::zero), request.dy.then(T::zero))
        };

        Evaluated {
            value: limit.value,
            dfdx,
            dfdy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AttributeFlags, PatchRecord, PatchSample};

    /// Reads value, `dads` and `dadt` from elements 0, 1 and 2.
    struct FixedPatchEval<'a>(AttributeBuffers<'a>);

    impl PatchEvaluator for FixedPatchEval<'_> {
        fn eval<T: Attribute>(&self, _: u32, _: usize, _: f32, _: f32, _: bool) -> PatchSample<T> {
            PatchSample {
                value: T::fetch(&self.0, 0),
                dads: T::fetch(&self.0, 1),
                dadt: T::fetch(&self.0, 2),
            }
        }
    }

    fn unit_uv() -> [Float2; 3] {
        [
            Float2::new(0.0, 0.0),
            Float2::new(1.0, 0.0),
            Float2::new(0.0, 1.0),
        ]
    }

    #[test]
    fn triangle_derivatives() {
        let du = Differential::new(1.0, 0.0);
        let dv = Differential::new(0.0, 1.0);
        assert_eq!(triangle_attribute_dfdx(du, dv, 1.0f32, 2.0, 4.0), 1.0);
        assert_eq!(triangle_attribute_dfdy(du, dv, 1.0f32, 2.0, 4.0), 3.0);
    }

    #[test]
    fn patch_derivative_chain() {
        let (dfdx, dfdy) = patch_attribute_df(
            Differential::new(2.0, 0.0),
            Differential::new(0.0, 0.0),
            1.0f32,
            0.0,
            Float2::new(1.0, 0.0),
            Float2::new(0.0, 1.0),
            DerivativeRequest::DX,
        );
        assert_eq!(dfdx, Some(2.0));
        assert_eq!(dfdy, None);
    }

    #[test]
    fn unknown_element_is_zero() {
        let records = [PatchRecord::quad([0, 1, 2, 3], 0, 0)];
        let uv = unit_uv();
        let mesh = SubdMesh::new(PatchRecord::words(&records), &[0], &[[0, 1, 2]], &uv).unwrap();
        let float = [5.0; 4];
        let evaluator = SubdAttributeEvaluator::new(
            mesh,
            AttributeBuffers {
                float: &float,
                ..Default::default()
            },
        );

        for element in [
            AttributeElement::None,
            AttributeElement::Object,
            AttributeElement::Mesh,
            AttributeElement::Curve,
            AttributeElement::CurveKey,
            AttributeElement::CurveKeyMotion,
            AttributeElement::Voxel,
        ] {
            let desc = AttributeDescriptor::new(element, 0, AttributeType::Float);
            let result = evaluator.evaluate_with_derivatives::<f32>(
                &ShaderSample::new(0, 0.2, 0.2),
                &desc,
                DerivativeRequest::BOTH,
            );
            assert_eq!(
                result,
                Evaluated {
                    value: 0.0,
                    dfdx: Some(0.0),
                    dfdy: Some(0.0)
                }
            );
        }
    }

    #[cfg(all(feature = "patch_eval", feature = "ray_differentials"))]
    #[test]
    fn subdivided_uses_patch_evaluator() {
        let records = [PatchRecord::quad([0, 1, 2, 3], 0, 0)];
        let uv = unit_uv();
        let mesh = SubdMesh::new(PatchRecord::words(&records), &[0], &[[0, 1, 2]], &uv).unwrap();
        let evaluator = SubdAttributeEvaluator::with_patch_evaluator(
            mesh,
            AttributeBuffers::default(),
            FixedPatchEval(AttributeBuffers {
                float: &[7.0, 1.0, 0.0],
                ..Default::default()
            }),
        );

        let desc = AttributeDescriptor::new(AttributeElement::Vertex, 0, AttributeType::Float)
            .with_flags(AttributeFlags::SUBDIVIDED);
        let sample = ShaderSample::new(0, 0.25, 0.25)
            .with_differentials(Differential::new(2.0, 0.0), Differential::new(0.0, 0.0));

        let result =
            evaluator.evaluate_with_derivatives::<f32>(&sample, &desc, DerivativeRequest::BOTH);
        assert_eq!(result.value, 7.0);
        assert_eq!(result.dfdx, Some(2.0));
        assert_eq!(result.dfdy, Some(0.0));
    }

    #[cfg(all(feature = "patch_eval", not(feature = "ray_differentials")))]
    #[test]
    fn subdivided_derivatives_are_flat_without_differentials() {
        let records = [PatchRecord::quad([0, 1, 2, 3], 0, 0)];
        let uv = unit_uv();
        let mesh = SubdMesh::new(PatchRecord::words(&records), &[0], &[[0, 1, 2]], &uv).unwrap();
        let evaluator = SubdAttributeEvaluator::with_patch_evaluator(
            mesh,
            AttributeBuffers::default(),
            FixedPatchEval(AttributeBuffers {
                float: &[7.0, 1.0, 0.0],
                ..Default::default()
            }),
        );

        let desc = AttributeDescriptor::new(AttributeElement::Vertex, 0, AttributeType::Float)
            .with_flags(AttributeFlags::SUBDIVIDED);
        let sample = ShaderSample::new(0, 0.25, 0.25)
            .with_differentials(Differential::new(2.0, 0.0), Differential::new(0.0, 0.0));

        let result =
            evaluator.evaluate_with_derivatives::<f32>(&sample, &desc, DerivativeRequest::BOTH);
        assert_eq!(
            result,
            Evaluated {
                value: 7.0,
                dfdx: Some(0.0),
                dfdy: Some(0.0)
            }
        );
    }

    #[cfg(not(feature = "patch_eval"))]
    #[test]
    fn subdivided_falls_through_to_element() {
        let records = [PatchRecord::quad([0, 1, 2, 3], 0, 0)];
        let uv = unit_uv();
        let mesh = SubdMesh::new(PatchRecord::words(&records), &[0], &[[0, 1, 2]], &uv).unwrap();
        let float = [1.0, 2.0, 3.0, 4.0];
        let evaluator = SubdAttributeEvaluator::with_patch_evaluator(
            mesh,
            AttributeBuffers {
                float: &float,
                ..Default::default()
            },
            FixedPatchEval(AttributeBuffers {
                float: &[7.0, 1.0, 0.0],
                ..Default::default()
            }),
        );

        let desc = AttributeDescriptor::new(AttributeElement::Vertex, 0, AttributeType::Float)
            .with_flags(AttributeFlags::SUBDIVIDED);
        let sample = ShaderSample::new(0, 0.5, 0.5)
            .with_differentials(Differential::new(1.0, 0.0), Differential::new(0.0, 1.0));

        // The patch evaluator is never consulted: (0.5, 0.5) blends vertices 1
        // and 3 of the quad.
        let result =
            evaluator.evaluate_with_derivatives::<f32>(&sample, &desc, DerivativeRequest::BOTH);
        let (dfdx, dfdy) = if cfg!(feature = "ray_differentials") {
            (1.0, 3.0)
        } else {
            (0.0, 0.0)
        };
        assert_eq!(
            result,
            Evaluated {
                value: 3.0,
                dfdx: Some(dfdx),
                dfdy: Some(dfdy)
            }
        );
    }

    #[cfg(not(feature = "ray_differentials"))]
    #[test]
    fn interpolated_derivatives_are_flat_without_differentials() {
        let records = [PatchRecord::ngon([0, 1, 2, 3], 0, 5, 1, 0, 5)];
        let uv = unit_uv();
        let mesh = SubdMesh::new(PatchRecord::words(&records), &[0], &[[0, 1, 2]], &uv).unwrap();
        let float: Vec<f32> = (0..6).map(|i| i as f32 * 2.0).collect();
        let evaluator = SubdAttributeEvaluator::new(
            mesh,
            AttributeBuffers {
                float: &float,
                ..Default::default()
            },
        );
        let sample = ShaderSample::new(0, 0.3, 0.3)
            .with_differentials(Differential::new(1.0, 2.0), Differential::new(3.0, 4.0));

        for element in [AttributeElement::Vertex, AttributeElement::Corner] {
            let desc = AttributeDescriptor::new(element, 0, AttributeType::Float);
            let result =
                evaluator.evaluate_with_derivatives::<f32>(&sample, &desc, DerivativeRequest::BOTH);
            assert_eq!(result.value, evaluator.evaluate::<f32>(&sample, &desc));
            assert_eq!((result.dfdx, result.dfdy), (Some(0.0), Some(0.0)));

            let dx =
                evaluator.evaluate_with_derivatives::<f32>(&sample, &desc, DerivativeRequest::DX);
            assert_eq!((dx.dfdx, dx.dfdy), (Some(0.0), None));
        }
    }
}
