//! Shades the centers of the triangles of a tessellated pentagon.
//!
//! The pentagon is split into five quad patches about its center; every patch
//! is cut into two triangles. A per-vertex scalar and a per-corner byte color
//! are evaluated at each triangle center.
use subd_shading::ultraviolet::Vec4;
use subd_shading::*;

fn main() -> anyhow::Result<()> {
    const N: u32 = 5;
    // Vertices 0..5 are the pentagon corners, vertex 5 is its center.
    const CENTER: u32 = N;

    let records: Vec<PatchRecord> = (0..N)
        .map(|c| {
            PatchRecord::ngon(
                [c, (c + 1) % N, CENTER, (c + N - 1) % N],
                0,
                N as u16,
                c as u16,
                0,
                N,
            )
        })
        .collect();

    let tri_patch: Vec<u32> = (0..N)
        .flat_map(|c| [c * PatchRecord::WORDS as u32; 2])
        .collect();
    let tri_vindex: Vec<[u32; 3]> = (0..N).flat_map(|_| [[0, 1, 2], [0, 2, 3]]).collect();
    let tri_patch_uv = [
        Float2::new(0.0, 0.0),
        Float2::new(1.0, 0.0),
        Float2::new(1.0, 1.0),
        Float2::new(0.0, 1.0),
    ];

    let mesh = SubdMesh::new(
        PatchRecord::words(&records),
        &tri_patch,
        &tri_vindex,
        &tri_patch_uv,
    )?;

    // Height per vertex, the center sits at the average.
    let heights = [0.0, 1.0, 2.0, 3.0, 4.0, 2.0];
    // One color per corner, the center corner is gray.
    let colors = [
        [255, 0, 0, 255],
        [255, 255, 0, 255],
        [0, 255, 0, 255],
        [0, 255, 255, 255],
        [0, 0, 255, 255],
        [128, 128, 128, 255],
    ];

    let buffers = AttributeBuffers {
        float: &heights,
        byte_color: &colors,
        ..Default::default()
    };
    let evaluator = SubdAttributeEvaluator::with_patch_evaluator(
        mesh,
        buffers,
        BilinearPatchEvaluator::new(mesh, buffers),
    );

    let height = AttributeDescriptor::new(AttributeElement::Vertex, 0, AttributeType::Float);
    let limit_height = height.with_flags(AttributeFlags::SUBDIVIDED);
    let color = AttributeDescriptor::new(AttributeElement::CornerByte, 0, AttributeType::Rgba);

    for prim in 0..mesh.triangle_count() {
        let sample = ShaderSample::new(prim, 1.0 / 3.0, 1.0 / 3.0)
            .with_differentials(Differential::new(0.01, 0.0), Differential::new(0.0, 0.01));

        let h =
            evaluator.evaluate_with_derivatives::<f32>(&sample, &height, DerivativeRequest::BOTH);
        let limit = evaluator.evaluate::<f32>(&sample, &limit_height);
        let c = evaluator.evaluate::<Vec4>(&sample, &color);

        println!(
            "triangle {prim:2}: height {:.3} (limit {:.3}, dx {:+.4}, dy {:+.4}) \
             color ({:.2}, {:.2}, {:.2})",
            h.value,
            limit,
            h.dfdx.unwrap_or_default(),
            h.dfdy.unwrap_or_default(),
            c.x,
            c.y,
            c.z,
        );
    }

    Ok(())
}
