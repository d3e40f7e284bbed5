//! # Attribute Storage and Descriptors
//!
//! Attribute values are kept in a handful of flat, typed arrays shared by all
//! attributes of a scene. An [`AttributeDescriptor`] says where one attribute
//! starts in those arrays (`offset`), how its values are keyed
//! ([`AttributeElement`]) and whether it has to be evaluated on the limit
//! surface ([`AttributeFlags::SUBDIVIDED`]).
//!
//! ## Example
//! ```
//! use subd_shading::{AttributeBuffers, AttributeDescriptor, AttributeElement, AttributeType};
//!
//! let colors = [[255u8, 0, 0, 255]; 4];
//! let buffers = AttributeBuffers {
//!     byte_color: &colors,
//!     ..Default::default()
//! };
//!
//! let desc = AttributeDescriptor::new(AttributeElement::CornerByte, 0, AttributeType::Rgba);
//! assert!(!desc.is_subdivided());
//! assert_eq!(buffers.byte_color.len(), 4);
//! ```
use derive_more::{BitAnd, BitAndAssign, BitOr, BitOrAssign};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use slice_of_array::prelude::*;

use crate::{Error, Result};

/// How the values of an attribute are keyed.
#[repr(u32)]
#[derive(TryFromPrimitive, IntoPrimitive, Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum AttributeElement {
    /// No storage.
    None = 0,
    /// One value per object.
    Object,
    /// One value per mesh.
    Mesh,
    /// One value per original face.
    Face,
    /// One value per control vertex.
    Vertex,
    /// One value per control vertex and motion step. The descriptor offset
    /// already points at the step to read.
    VertexMotion,
    /// One value per face corner.
    Corner,
    /// One byte color per face corner.
    CornerByte,
    /// One value per curve.
    Curve,
    /// One value per curve key.
    CurveKey,
    /// One value per curve key and motion step.
    CurveKeyMotion,
    /// Volume grid.
    Voxel,
}

/// The value type an attribute was authored with.
///
/// Only [`Rgba`](AttributeType::Rgba) changes evaluation: it selects the
/// color-aware branch of the [`PatchEvaluator`](crate::PatchEvaluator).
#[repr(u32)]
#[derive(TryFromPrimitive, IntoPrimitive, Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum AttributeType {
    Float = 0,
    Float2,
    Float3,
    Float4,
    Rgba,
    Matrix,
}

/// Bit set of attribute flags.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, Hash, BitOr, BitAnd, BitOrAssign, BitAndAssign,
)]
#[repr(transparent)]
pub struct AttributeFlags(pub u32);

impl AttributeFlags {
    pub const NONE: AttributeFlags = AttributeFlags(0);
    /// Values are defined on the limit surface and must be evaluated with a
    /// [`PatchEvaluator`](crate::PatchEvaluator).
    pub const SUBDIVIDED: AttributeFlags = AttributeFlags(1 << 0);

    #[inline]
    pub fn contains(self, other: AttributeFlags) -> bool {
        (self & other) == other
    }
}

/// Where and how one attribute is stored.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct AttributeDescriptor {
    pub element: AttributeElement,
    /// Base index into the typed attribute array.
    pub offset: u32,
    pub ty: AttributeType,
    pub flags: AttributeFlags,
}

impl AttributeDescriptor {
    #[inline]
    pub fn new(element: AttributeElement, offset: u32, ty: AttributeType) -> Self {
        Self {
            element,
            offset,
            ty,
            flags: AttributeFlags::NONE,
        }
    }

    /// Returns a copy with `flags` set.
    #[inline]
    pub fn with_flags(mut self, flags: AttributeFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Decodes a descriptor packed as raw ids, the way it is stored in
    /// device-side attribute maps.
    pub fn from_raw(element: u32, offset: u32, ty: u32, flags: u32) -> Result<Self> {
        let element =
            AttributeElement::try_from(element).map_err(|e| Error::UnknownElement(e.number))?;
        let ty = AttributeType::try_from(ty).map_err(|e| Error::UnknownType(e.number))?;

        Ok(Self {
            element,
            offset,
            ty,
            flags: AttributeFlags(flags),
        })
    }

    /// Returns the raw `(element, offset, type, flags)` words.
    #[inline]
    pub fn to_raw(self) -> [u32; 4] {
        [self.element.into(), self.offset, self.ty.into(), self.flags.0]
    }

    #[inline]
    pub fn is_subdivided(&self) -> bool {
        self.flags.contains(AttributeFlags::SUBDIVIDED)
    }
}

/// Borrowed views of the typed attribute arrays of a scene.
///
/// Every array is shared by all attributes of its type; a descriptor's
/// `offset` selects the range belonging to one attribute.
#[derive(Copy, Clone, Debug, Default)]
pub struct AttributeBuffers<'a> {
    pub float: &'a [f32],
    pub float2: &'a [[f32; 2]],
    pub float3: &'a [[f32; 3]],
    pub float4: &'a [[f32; 4]],
    pub byte_color: &'a [[u8; 4]],
}

impl<'a> AttributeBuffers<'a> {
    /// Creates buffers from flat float arrays.
    ///
    /// The `float2`, `float3` and `float4` slices are interpreted as tightly
    /// packed tuples.
    pub fn from_flat(
        float: &'a [f32],
        float2: &'a [f32],
        float3: &'a [f32],
        float4: &'a [f32],
        byte_color: &'a [u8],
    ) -> Result<Self> {
        check_stride(float2.len(), 2)?;
        check_stride(float3.len(), 3)?;
        check_stride(float4.len(), 4)?;
        check_stride(byte_color.len(), 4)?;

        Ok(Self {
            float,
            float2: float2.nest(),
            float3: float3.nest(),
            float4: float4.nest(),
            byte_color: byte_color.nest(),
        })
    }

    /// Fetches element `index` as `T`.
    #[inline]
    pub fn fetch<T: crate::Attribute>(&self, index: usize) -> T {
        T::fetch(self, index)
    }

    /// Fetches byte color `index` converted to `T`.
    #[inline]
    pub fn fetch_byte_color<T: crate::Attribute>(&self, index: usize) -> T {
        T::fetch_byte_color(self, index)
    }
}

fn check_stride(len: usize, stride: usize) -> Result<()> {
    if len % stride != 0 {
        return Err(Error::InvalidBufferSize {
            expected: len - len % stride + stride,
            actual: len,
        });
    }
    Ok(())
}
