//! # Patch Directory
//!
//! When a subdivision face is tessellated every resulting triangle keeps a
//! link back to the quad patch it was cut from. A [`SubdMesh`] is a read-only
//! view over the arrays that store these links:
//!
//! * `patches` – flat `u32` array of [`PatchRecord`]s. A patch is addressed by
//!   the word offset of its record, not by a record index.
//! * `tri_patch` – for each triangle the word offset of its patch.
//! * `tri_vindex` – for each triangle its three vertex indices.
//! * `tri_patch_uv` – for each triangle vertex its `(s, t)` coordinate inside
//!   the patch parameter domain.
//!
//! Faces with four corners map to a single patch. Any other face (an *n-gon*)
//! is split into `n` quad patches that share the face center, patch `c`
//! spanning from corner `c` to the midpoints of its two adjacent edges.
//!
//! ## Example
//! ```
//! use subd_shading::{PatchRecord, SubdMesh, Float2};
//!
//! let records = [PatchRecord::quad([0, 1, 2, 3], 7, 0)];
//! let patches = PatchRecord::words(&records);
//! let uv = [Float2::new(0.0, 0.0), Float2::new(1.0, 0.0), Float2::new(0.0, 1.0)];
//!
//! let mesh = SubdMesh::new(patches, &[0], &[[0, 1, 2]], &uv).unwrap();
//! assert_eq!(mesh.patch_face(mesh.patch_of(0)), 7);
//! assert_eq!(mesh.patch_corners(0), [0, 1, 2, 3]);
//! ```
use bytemuck::{Pod, Zeroable};

use crate::{math::Float2, Error, Result};

/// One quad patch of an original face, exactly as laid out in the `patches`
/// array.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct PatchRecord {
    /// Control vertex indices of the patch.
    pub vertices: [u32; 4],
    /// Index of the originating face.
    pub face: u32,
    /// Low 16 bits: number of corners of the face. High 16 bits: corner of
    /// the face this patch starts at (n-gons only).
    pub packed: u32,
    /// Index of the first corner of the face in corner attribute arrays.
    pub corner_base: u32,
    /// Corner index of the face center (n-gons only).
    pub corner_extra: u32,
}

impl PatchRecord {
    /// Number of `u32` words per record.
    pub const WORDS: usize = 8;

    /// A patch covering a whole quad face.
    #[inline]
    pub fn quad(vertices: [u32; 4], face: u32, corner_base: u32) -> Self {
        Self {
            vertices,
            face,
            packed: 4,
            corner_base,
            corner_extra: 0,
        }
    }

    /// Patch `corner` of a face with `corners_len` corners, split about its
    /// center.
    ///
    /// `vertices` are, in patch order: the vertex at `corner`, the next
    /// vertex of the face, the face center vertex and the previous vertex of
    /// the face. Interpolation moves the two neighbours to the edge
    /// midpoints.
    #[inline]
    pub fn ngon(
        vertices: [u32; 4],
        face: u32,
        corners_len: u16,
        corner: u16,
        corner_base: u32,
        corner_extra: u32,
    ) -> Self {
        Self {
            vertices,
            face,
            packed: (corners_len as u32) | ((corner as u32) << 16),
            corner_base,
            corner_extra,
        }
    }

    /// Number of corners on the originating face.
    #[inline]
    pub fn corners_len(&self) -> u32 {
        self.packed & 0xffff
    }

    /// The corner of the originating face this patch starts at.
    #[inline]
    pub fn corner(&self) -> u32 {
        self.packed >> 16
    }

    /// Indices of the four face corners used by this patch.
    #[inline]
    pub fn corners(&self) -> [u32; 4] {
        let n = self.corners_len();
        let base = self.corner_base;

        if n == 4 {
            [base, base + 1, base + 2, base + 3]
        } else {
            let c = self.corner();
            // Circular neighbours; written so `c - 1` never wraps below zero.
            [
                base + c,
                base + (c + 1) % n,
                self.corner_extra,
                base + (c + n - 1) % n,
            ]
        }
    }

    /// Views a slice of records as the flat `u32` array the directory reads.
    #[inline]
    pub fn words(records: &[PatchRecord]) -> &[u32] {
        bytemuck::cast_slice(records)
    }
}

/// Read-only view of the patch directory of a tessellated subdivision mesh.
///
/// All lookups are constant time. Ids are trusted: the scene guarantees that
/// they are valid, out of range ids panic on the slice access.
#[derive(Copy, Clone, Debug)]
pub struct SubdMesh<'a> {
    patches: &'a [u32],
    tri_patch: &'a [u32],
    tri_vindex: &'a [[u32; 3]],
    tri_patch_uv: &'a [Float2],
}

impl<'a> SubdMesh<'a> {
    /// Wraps the scene arrays.
    ///
    /// With the `topology_validation` feature every record and triangle is
    /// checked once here so the lookups can stay unchecked.
    pub fn new(
        patches: &'a [u32],
        tri_patch: &'a [u32],
        tri_vindex: &'a [[u32; 3]],
        tri_patch_uv: &'a [Float2],
    ) -> Result<Self> {
        if tri_patch.len() != tri_vindex.len() {
            return Err(Error::InvalidBufferSize {
                expected: tri_vindex.len(),
                actual: tri_patch.len(),
            });
        }

        let mesh = Self {
            patches,
            tri_patch,
            tri_vindex,
            tri_patch_uv,
        };

        #[cfg(feature = "topology_validation")]
        mesh.validate()?;

        log::debug!(
            "subd mesh: {} patch words, {} triangles, {} patch uvs",
            patches.len(),
            tri_patch.len(),
            tri_patch_uv.len()
        );

        Ok(mesh)
    }

    #[cfg(feature = "topology_validation")]
    fn validate(&self) -> Result<()> {
        if self.patches.len() % PatchRecord::WORDS != 0 {
            return Err(Error::PatchArrayLength {
                len: self.patches.len(),
                record_len: PatchRecord::WORDS,
            });
        }

        for patch in (0..self.patches.len()).step_by(PatchRecord::WORDS) {
            let record = self.record(patch);
            let n = record.corners_len();
            if n < 3 {
                return Err(Error::InvalidPatch {
                    patch,
                    reason: format!("face has {} corners (should be >= 3)", n),
                });
            }
            if n != 4 && n <= record.corner() {
                return Err(Error::InvalidPatch {
                    patch,
                    reason: format!(
                        "start corner {} is out of range (should be < {})",
                        record.corner(),
                        n
                    ),
                });
            }
        }

        for (prim, (&patch, vindex)) in self.tri_patch.iter().zip(self.tri_vindex).enumerate() {
            let patch = patch as usize;
            if patch % PatchRecord::WORDS != 0 || self.patches.len() < patch + PatchRecord::WORDS
            {
                return Err(Error::InvalidTriangle {
                    prim,
                    reason: format!("patch offset {} does not address a record", patch),
                });
            }
            for &v in vindex {
                if self.tri_patch_uv.len() <= v as usize {
                    return Err(Error::InvalidTriangle {
                        prim,
                        reason: format!(
                            "vertex index {} is out of range (should be < {})",
                            v,
                            self.tri_patch_uv.len()
                        ),
                    });
                }
            }
            for uv in self.patch_uv(prim) {
                if !(0.0..=1.0).contains(&uv.x) || !(0.0..=1.0).contains(&uv.y) {
                    log::warn!(
                        "triangle {} has patch uv ({}, {}) outside of the unit square",
                        prim,
                        uv.x,
                        uv.y
                    );
                }
            }
        }

        Ok(())
    }

    /// Number of triangles.
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.tri_patch.len()
    }

    /// Number of patch records.
    #[inline]
    pub fn patch_count(&self) -> usize {
        self.patches.len() / PatchRecord::WORDS
    }

    /// Returns the patch (word offset) a triangle was tessellated from.
    #[inline]
    pub fn patch_of(&self, prim: usize) -> usize {
        self.tri_patch[prim] as usize
    }

    /// Returns the patch parameter coordinates of the three triangle
    /// vertices.
    #[inline]
    pub fn patch_uv(&self, prim: usize) -> [Float2; 3] {
        let [a, b, c] = self.tri_vindex[prim];
        [
            self.tri_patch_uv[a as usize],
            self.tri_patch_uv[b as usize],
            self.tri_patch_uv[c as usize],
        ]
    }

    /// Returns the whole record of a patch.
    #[inline]
    pub fn record(&self, patch: usize) -> PatchRecord {
        *bytemuck::from_bytes(bytemuck::cast_slice(
            &self.patches[patch..patch + PatchRecord::WORDS],
        ))
    }

    /// Returns the control vertex indices of a patch.
    #[inline]
    pub fn patch_indices(&self, patch: usize) -> [u32; 4] {
        [
            self.patches[patch],
            self.patches[patch + 1],
            self.patches[patch + 2],
            self.patches[patch + 3],
        ]
    }

    /// Returns the originating face of a patch.
    #[inline]
    pub fn patch_face(&self, patch: usize) -> u32 {
        self.patches[patch + 4]
    }

    /// Returns the number of corners of the originating face.
    #[inline]
    pub fn patch_corners_len(&self, patch: usize) -> u32 {
        self.patches[patch + 5] & 0xffff
    }

    /// Returns the indices of the four face corners used by a patch.
    #[inline]
    pub fn patch_corners(&self, patch: usize) -> [u32; 4] {
        self.record(patch).corners()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_uv() -> [Float2; 3] {
        [
            Float2::new(0.0, 0.0),
            Float2::new(1.0, 0.0),
            Float2::new(0.0, 1.0),
        ]
    }

    #[test]
    fn record_layout() {
        assert_eq!(std::mem::size_of::<PatchRecord>(), PatchRecord::WORDS * 4);

        let record = PatchRecord::ngon([1, 2, 3, 4], 5, 6, 2, 10, 16);
        let words = PatchRecord::words(std::slice::from_ref(&record));
        assert_eq!(words, &[1, 2, 3, 4, 5, 6 | (2 << 16), 10, 16]);
    }

    #[test]
    fn quad_corners() {
        assert_eq!(PatchRecord::quad([0; 4], 0, 8).corners(), [8, 9, 10, 11]);
    }

    #[test]
    fn ngon_corners_wrap_around() {
        // First corner: the previous corner wraps to the end of the face.
        let first = PatchRecord::ngon([0; 4], 0, 5, 0, 20, 99);
        assert_eq!(first.corners(), [20, 21, 99, 24]);

        // Last corner: the next corner wraps to the start of the face.
        let last = PatchRecord::ngon([0; 4], 0, 5, 4, 20, 99);
        assert_eq!(last.corners(), [24, 20, 99, 23]);

        let triangle = PatchRecord::ngon([0; 4], 0, 3, 1, 0, 3);
        assert_eq!(triangle.corners(), [1, 2, 3, 0]);
    }

    #[test]
    fn lookups() {
        let records = [
            PatchRecord::quad([0, 1, 2, 3], 0, 0),
            PatchRecord::ngon([4, 5, 6, 7], 1, 5, 3, 4, 9),
        ];
        let uv = unit_uv();
        let mesh = SubdMesh::new(
            PatchRecord::words(&records),
            &[0, 8],
            &[[0, 1, 2], [2, 1, 0]],
            &uv,
        )
        .unwrap();

        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.patch_count(), 2);
        assert_eq!(mesh.patch_of(1), 8);
        assert_eq!(mesh.patch_indices(8), [4, 5, 6, 7]);
        assert_eq!(mesh.patch_face(8), 1);
        assert_eq!(mesh.patch_corners_len(8), 5);
        assert_eq!(mesh.patch_corners(8), [7, 8, 9, 6]);
        assert_eq!(mesh.record(8), records[1]);
        assert_eq!(mesh.patch_uv(1), [uv[2], uv[1], uv[0]]);
    }

    #[test]
    fn mismatched_triangle_arrays() {
        let records = [PatchRecord::quad([0, 1, 2, 3], 0, 0)];
        let uv = unit_uv();
        assert!(matches!(
            SubdMesh::new(PatchRecord::words(&records), &[0, 0], &[[0, 1, 2]], &uv),
            Err(Error::InvalidBufferSize { .. })
        ));
    }

    #[cfg(feature = "topology_validation")]
    #[test]
    fn validation() {
        let uv = unit_uv();

        let degenerate = [PatchRecord::ngon([0; 4], 0, 2, 0, 0, 0)];
        assert!(matches!(
            SubdMesh::new(PatchRecord::words(&degenerate), &[0], &[[0, 1, 2]], &uv),
            Err(Error::InvalidPatch { patch: 0, .. })
        ));

        let records = [PatchRecord::quad([0, 1, 2, 3], 0, 0)];
        assert!(matches!(
            SubdMesh::new(PatchRecord::words(&records), &[8], &[[0, 1, 2]], &uv),
            Err(Error::InvalidTriangle { prim: 0, .. })
        ));
        assert!(matches!(
            SubdMesh::new(PatchRecord::words(&records), &[0], &[[0, 1, 3]], &uv),
            Err(Error::InvalidTriangle { prim: 0, .. })
        ));
        assert!(matches!(
            SubdMesh::new(&[0, 1, 2], &[], &[], &uv),
            Err(Error::PatchArrayLength { len: 3, .. })
        ));
    }
}
