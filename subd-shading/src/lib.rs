//#![warn(missing_docs)]
//! # Subdivision Triangle Attributes
//!
//! Shading attribute evaluation for triangles that were tessellated from
//! subdivision surfaces.
//!
//! A path tracer intersects rays with triangles, but attributes like UVs,
//! colors or arbitrary per-vertex/per-face/per-corner data live on the
//! patches of the original subdivision mesh. Given a hit `(prim, u, v)` on a
//! tessellated triangle and an [`AttributeDescriptor`], this crate
//! reconstructs the attribute value as it appears on the original patch,
//! together with its screen-space derivatives for filtered texture lookups.
//!
//! The building blocks, leaves first:
//!
//! * [`SubdMesh`] – the *patch directory*. Read-only view of the patch
//!   records and the triangle-to-patch mapping.
//! * [`AttributeBuffers`] – the typed attribute arrays of a scene.
//! * [`PatchEvaluator`] – evaluates *subdivided* attributes on the limit
//!   surface.
//! * [`SubdAttributeEvaluator`] – picks the code path for the attribute's
//!   storage element and interpolates.
//!
//! All of these borrow scene data. Nothing allocates, locks or fails on the
//! evaluation path; errors are only reported when views are created.
//!
//! Attribute values can be [`f32`] or the `ultraviolet` vectors
//! [`Vec2`](ultraviolet::Vec2), [`Vec3`](ultraviolet::Vec3) and
//! [`Vec4`](ultraviolet::Vec4); see [`Attribute`].
//!
//! ## Features
#![doc = document_features::document_features!()]
//!
//! ## API Notes
//!
//! * Patches are addressed by the *word offset* of their record inside the
//!   flat patch array, the way tessellation writes them. Not by record index.
//! * Counts use the `_len` suffix (`patch_corners_len()`), indices are
//!   unsigned.

pub mod attribute;
pub mod batch;
pub mod error;
pub mod evaluator;
pub mod math;
pub mod patch;
pub mod patch_eval;

pub use attribute::*;
pub use error::{Error, Result};
pub use evaluator::*;
pub use math::{mix, Attribute, Differential, Float2};
pub use patch::*;
pub use patch_eval::*;

pub use ultraviolet;
