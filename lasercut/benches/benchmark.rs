use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use lasercut::{
    boundary::boundary_edges,
    export::{export_mesh, ExportParams},
    mesh::Mesh,
    outline::assemble,
    Pos,
};

/// Square plate of `size` by `size` quads with a hole punched in the middle
/// of every 3x3 block.
fn perforated_plate(size: u32) -> Mesh {
    let side = size + 1;
    let vertices = (0..side * side)
        .map(|i| Pos::new((i % side) as f64, (i / side) as f64, 0.0))
        .collect();
    let faces = (0..size * size)
        .filter(|i| !(i % size % 3 == 1 && i / size % 3 == 1))
        .map(|i| {
            let a = (i / size) * side + i % size;
            vec![a, a + 1, a + side + 1, a + side]
        })
        .collect();
    Mesh::new(vertices, faces).unwrap()
}

pub fn bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("Outline Export");

    for size in [30, 150, 600] {
        let mesh = perforated_plate(size);
        let boundary = boundary_edges(&mesh).unwrap();

        group.bench_with_input(
            BenchmarkId::new("Assemble", size),
            &(mesh.clone(), boundary),
            |b, (mesh, boundary)| b.iter(|| assemble(mesh, boundary).unwrap()),
        );

        group.bench_with_input(BenchmarkId::new("Export", size), &mesh, |b, mesh| {
            b.iter(|| export_mesh(mesh, &ExportParams::default()).unwrap())
        });
    }
}

criterion_group!(benches, bench);
criterion_main!(benches);
