//! # Linear-Space Attribute Values
//!
//! Attributes are evaluated for a handful of value types: [`f32`],
//! [`Vec2`](ultraviolet::Vec2), [`Vec3`](ultraviolet::Vec3) and
//! [`Vec4`](ultraviolet::Vec4). All the evaluator needs from them is
//! addition, subtraction, scaling by a scalar and a zero. The [`Attribute`]
//! trait captures exactly that, plus the typed fetches from
//! [`AttributeBuffers`].
use std::ops::{Add, Mul, Sub};

use ultraviolet::{Vec2, Vec3, Vec4};

use crate::attribute::AttributeBuffers;

/// A two component float vector, used for patch parameter coordinates.
pub type Float2 = Vec2;

/// Partial derivatives of a scalar with respect to screen-space `x` and `y`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Differential {
    pub dx: f32,
    pub dy: f32,
}

impl Differential {
    pub const ZERO: Differential = Differential { dx: 0.0, dy: 0.0 };

    #[inline]
    pub const fn new(dx: f32, dy: f32) -> Self {
        Self { dx, dy }
    }
}

/// A value that lives in a linear space and can be fetched from attribute
/// storage.
///
/// Implemented for [`f32`], [`Vec2`], [`Vec3`] and [`Vec4`].
pub trait Attribute:
    Copy + Add<Output = Self> + Sub<Output = Self> + Mul<f32, Output = Self> + Send + Sync
{
    /// The additive identity.
    fn zero() -> Self;

    /// Reads element `index` of the array matching `Self`.
    ///
    /// The index must be in bounds; scene data is trusted.
    fn fetch(buffers: &AttributeBuffers<'_>, index: usize) -> Self;

    /// Reads element `index` of the byte color array, converted to linear
    /// floating point and narrowed to `Self`.
    fn fetch_byte_color(buffers: &AttributeBuffers<'_>, index: usize) -> Self;
}

/// Linear interpolation, `a` at `t = 0` and `b` at `t = 1`.
#[inline]
pub fn mix<T: Attribute>(a: T, b: T, t: f32) -> T {
    a * (1.0 - t) + b * t
}

/// The four values at the corners of a quad patch, in patch order.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Quad<T>(pub [T; 4]);

impl<T: Attribute> Quad<T> {
    /// An n-gon patch spans from a face corner to the midpoints of its two
    /// adjacent edges. Corners 1 and 3 are stored as the far edge ends, so
    /// move them to the midpoints.
    #[inline]
    pub fn ngon_midpoints(self) -> Self {
        let [f0, f1, f2, f3] = self.0;
        Quad([f0, (f1 + f0) * 0.5, f2, (f3 + f0) * 0.5])
    }

    /// Bilinear interpolation at patch coordinate `uv`.
    #[inline]
    pub fn at(&self, uv: Float2) -> T {
        let [f0, f1, f2, f3] = self.0;
        mix(mix(f0, f1, uv.x), mix(f3, f2, uv.x), uv.y)
    }

    /// Partial derivatives of [`at()`](Self::at) with respect to `s` and `t`.
    #[inline]
    pub fn partials(&self, uv: Float2) -> (T, T) {
        let [f0, f1, f2, f3] = self.0;
        let dads = mix(f1 - f0, f2 - f3, uv.y);
        let dadt = mix(f3, f2, uv.x) - mix(f0, f1, uv.x);
        (dads, dadt)
    }
}

#[inline]
fn byte_color(buffers: &AttributeBuffers<'_>, index: usize) -> Vec4 {
    color_srgb_to_linear(byte_to_float(buffers.byte_color[index]))
}

/// Maps `[0, 255]` channels to `[0, 1]`.
#[inline]
pub fn byte_to_float(c: [u8; 4]) -> Vec4 {
    const SCALE: f32 = 1.0 / 255.0;
    Vec4::new(
        c[0] as f32 * SCALE,
        c[1] as f32 * SCALE,
        c[2] as f32 * SCALE,
        c[3] as f32 * SCALE,
    )
}

/// sRGB transfer function inverse for a single channel.
#[inline]
pub fn srgb_to_linear(c: f32) -> f32 {
    if c < 0.04045 {
        if c < 0.0 {
            0.0
        } else {
            c * (1.0 / 12.92)
        }
    } else {
        ((c + 0.055) * (1.0 / 1.055)).powf(2.4)
    }
}

/// Converts the color channels from sRGB to linear. Alpha is left as is.
#[inline]
pub fn color_srgb_to_linear(c: Vec4) -> Vec4 {
    Vec4::new(
        srgb_to_linear(c.x),
        srgb_to_linear(c.y),
        srgb_to_linear(c.z),
        c.w,
    )
}

impl Attribute for f32 {
    #[inline]
    fn zero() -> Self {
        0.0
    }

    #[inline]
    fn fetch(buffers: &AttributeBuffers<'_>, index: usize) -> Self {
        buffers.float[index]
    }

    #[inline]
    fn fetch_byte_color(buffers: &AttributeBuffers<'_>, index: usize) -> Self {
        let c = byte_color(buffers, index);
        (c.x + c.y + c.z) * (1.0 / 3.0)
    }
}

impl Attribute for Vec2 {
    #[inline]
    fn zero() -> Self {
        Vec2::zero()
    }

    #[inline]
    fn fetch(buffers: &AttributeBuffers<'_>, index: usize) -> Self {
        Vec2::from(buffers.float2[index])
    }

    #[inline]
    fn fetch_byte_color(buffers: &AttributeBuffers<'_>, index: usize) -> Self {
        let c = byte_color(buffers, index);
        Vec2::new(c.x, c.y)
    }
}

impl Attribute for Vec3 {
    #[inline]
    fn zero() -> Self {
        Vec3::zero()
    }

    #[inline]
    fn fetch(buffers: &AttributeBuffers<'_>, index: usize) -> Self {
        Vec3::from(buffers.float3[index])
    }

    #[inline]
    fn fetch_byte_color(buffers: &AttributeBuffers<'_>, index: usize) -> Self {
        byte_color(buffers, index).xyz()
    }
}

impl Attribute for Vec4 {
    #[inline]
    fn zero() -> Self {
        Vec4::zero()
    }

    #[inline]
    fn fetch(buffers: &AttributeBuffers<'_>, index: usize) -> Self {
        Vec4::from(buffers.float4[index])
    }

    #[inline]
    fn fetch_byte_color(buffers: &AttributeBuffers<'_>, index: usize) -> Self {
        byte_color(buffers, index)
    }
}
