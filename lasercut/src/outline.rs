use std::{collections::HashMap, iter};

use itertools::Itertools;
use tracing::debug;

use crate::{
    boundary::Edge,
    error::{ExportError, ExportResult},
    mesh::Mesh,
    Pos,
};

/// Index of a vertex in an [`Outlines`] arena.
pub type VertexId = u32;

/// One closed boundary loop. The last vertex connects back to the first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outline {
    vertices: Vec<VertexId>,
}

/// Every outline of one object along with the vertex arena they index into.
///
/// Ids are handed out as outlines are added, so they are unique across all
/// outlines of an export and no two outlines share one.
#[derive(Debug, Clone, PartialEq)]
pub struct Outlines<P> {
    positions: Vec<P>,
    sources: Vec<u32>,
    outlines: Vec<Outline>,
}

impl Outline {
    pub fn vertices(&self) -> &[VertexId] {
        &self.vertices
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Consecutive vertex pairs, ending with the edge from the last vertex
    /// back to the first.
    pub fn edges(&self) -> impl Iterator<Item = (VertexId, VertexId)> + '_ {
        self.vertices.iter().copied().circular_tuple_windows()
    }
}

impl<P> Outlines<P> {
    pub fn new() -> Self {
        Self {
            positions: Vec::new(),
            sources: Vec::new(),
            outlines: Vec::new(),
        }
    }

    /// Adds an outline, allocating a fresh vertex for every point. `points`
    /// pairs each position with the mesh vertex it came from.
    pub fn push(&mut self, points: impl IntoIterator<Item = (u32, P)>) {
        let vertices = points
            .into_iter()
            .map(|(source, position)| {
                self.positions.push(position);
                self.sources.push(source);
                (self.positions.len() - 1) as VertexId
            })
            .collect();
        self.outlines.push(Outline { vertices });
    }

    pub fn outlines(&self) -> &[Outline] {
        &self.outlines
    }

    pub fn len(&self) -> usize {
        self.outlines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outlines.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn positions(&self) -> &[P] {
        &self.positions
    }

    pub fn positions_mut(&mut self) -> &mut [P] {
        &mut self.positions
    }

    pub fn position(&self, id: VertexId) -> &P {
        &self.positions[id as usize]
    }

    /// The mesh vertex a vertex was created from.
    pub fn source(&self, id: VertexId) -> u32 {
        self.sources[id as usize]
    }

    /// Positions of an outline's vertices in loop order.
    pub fn points<'a>(&'a self, outline: &'a Outline) -> impl Iterator<Item = &'a P> + 'a {
        outline.vertices.iter().map(|&id| self.position(id))
    }

    /// Converts every position, keeping ids and loops unchanged.
    pub fn map<Q>(self, f: impl FnMut(&P) -> Q) -> Outlines<Q> {
        Outlines {
            positions: self.positions.iter().map(f).collect(),
            sources: self.sources,
            outlines: self.outlines,
        }
    }
}

impl<P> Default for Outlines<P> {
    fn default() -> Self {
        Self::new()
    }
}

/// Index from each vertex to the boundary edges touching it that have not
/// been walked yet.
struct Unconsumed<'a> {
    edges: &'a [Edge],
    incident: HashMap<u32, Vec<usize>>,
    consumed: Vec<bool>,
}

impl<'a> Unconsumed<'a> {
    fn new(edges: &'a [Edge]) -> Self {
        let mut incident = HashMap::<u32, Vec<usize>>::new();
        for (idx, edge) in edges.iter().enumerate() {
            for vertex in edge.vertices {
                incident.entry(vertex).or_default().push(idx);
            }
        }

        Self {
            edges,
            incident,
            consumed: vec![false; edges.len()],
        }
    }

    fn is_consumed(&self, edge: usize) -> bool {
        self.consumed[edge]
    }

    fn consume(&mut self, edge: usize) {
        self.consumed[edge] = true;
        for vertex in self.edges[edge].vertices {
            if let Some(list) = self.incident.get_mut(&vertex) {
                list.retain(|&x| x != edge);
            }
        }
    }

    /// Picks the next edge to walk from `vertex`, preferring one that leads
    /// straight back to `start`.
    fn next_from(&self, vertex: u32, start: u32) -> Option<usize> {
        let candidates = self.incident.get(&vertex)?;
        candidates
            .iter()
            .copied()
            .find(|&x| self.edges[x].opposite(vertex) == start)
            .or_else(|| candidates.first().copied())
    }
}

/// Walks the boundary edges of `mesh` into closed outlines.
///
/// Seeds are taken in edge order and oriented the way their face winds, so a
/// consistently wound mesh gives outlines in its winding direction. A mesh
/// without boundary gives no outlines. When a walk comes back to a vertex it
/// already passed, the loop since that vertex is split off as its own outline,
/// so loops touching at a vertex come out separately whatever the face order.
/// Boundaries that dead-end fail with [`ExportError::OpenBoundary`].
pub fn assemble(mesh: &Mesh, boundary: &[Edge]) -> ExportResult<Outlines<Pos>> {
    let mut unconsumed = Unconsumed::new(boundary);
    let mut worklist = (0..boundary.len()).rev().collect::<Vec<_>>();
    let mut outlines = Outlines::new();

    while let Some(seed) = worklist.pop() {
        if unconsumed.is_consumed(seed) {
            continue;
        }

        unconsumed.consume(seed);
        let [start, mut current] = boundary[seed].vertices;
        // position of every vertex of the open walk in `vertices`
        let mut visited = HashMap::from([(start, 0), (current, 1)]);
        let mut vertices = vec![start, current];

        loop {
            let Some(edge) = unconsumed.next_from(current, start) else {
                return Err(ExportError::OpenBoundary { vertex: current });
            };

            unconsumed.consume(edge);
            let next = boundary[edge].opposite(current);
            if next == start {
                break;
            }

            if let Some(&pos) = visited.get(&next) {
                let pinched = vertices.split_off(pos + 1);
                for vertex in pinched.iter() {
                    visited.remove(vertex);
                }

                outlines.push(
                    iter::once(next)
                        .chain(pinched)
                        .map(|x| (x, mesh.vertices()[x as usize])),
                );
                current = next;
                continue;
            }

            visited.insert(next, vertices.len());
            vertices.push(next);
            current = next;
        }

        outlines.push(
            vertices
                .into_iter()
                .map(|x| (x, mesh.vertices()[x as usize])),
        );
    }

    debug!(
        "Assembled {} outlines from {} boundary edges",
        outlines.len(),
        boundary.len()
    );
    Ok(outlines)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::boundary::boundary_edges;

    use super::*;

    fn outlines_of(mesh: &Mesh) -> ExportResult<Outlines<Pos>> {
        assemble(mesh, &boundary_edges(mesh)?)
    }

    fn square() -> Mesh {
        Mesh::new(
            vec![
                Pos::new(0.0, 0.0, 0.0),
                Pos::new(1.0, 0.0, 0.0),
                Pos::new(1.0, 1.0, 0.0),
                Pos::new(0.0, 1.0, 0.0),
            ],
            vec![vec![0, 1, 2], vec![0, 2, 3]],
        )
        .unwrap()
    }

    /// Square plate with a square hole, built from four quads.
    fn washer() -> Mesh {
        let mut vertices = Vec::new();
        for (x, y) in [(0.0, 0.0), (3.0, 0.0), (3.0, 3.0), (0.0, 3.0)] {
            vertices.push(Pos::new(x, y, 0.0));
        }
        for (x, y) in [(1.0, 1.0), (2.0, 1.0), (2.0, 2.0), (1.0, 2.0)] {
            vertices.push(Pos::new(x, y, 0.0));
        }

        let faces = (0..4)
            .map(|i| {
                let j = (i + 1) % 4;
                vec![i, j, j + 4, i + 4]
            })
            .collect();
        Mesh::new(vertices, faces).unwrap()
    }

    /// Triangle fan approximating a disc with `n` rim vertices.
    fn fan(n: u32) -> Mesh {
        let mut vertices = vec![Pos::zeros()];
        vertices.extend((0..n).map(|i| {
            let angle = i as f64 / n as f64 * std::f64::consts::TAU;
            Pos::new(angle.cos(), angle.sin(), 0.0)
        }));
        let faces = (0..n).map(|i| vec![0, i + 1, (i + 1) % n + 1]).collect();
        Mesh::new(vertices, faces).unwrap()
    }

    fn sources(outlines: &Outlines<Pos>, outline: &Outline) -> Vec<u32> {
        outline.vertices().iter().map(|&x| outlines.source(x)).collect()
    }

    #[test]
    fn square_outline() {
        let mesh = square();
        let outlines = outlines_of(&mesh).unwrap();

        assert_eq!(outlines.len(), 1);
        let outline = &outlines.outlines()[0];
        assert_eq!(sources(&outlines, outline), vec![0, 1, 2, 3]);

        let points = outlines.points(outline).copied().collect::<Vec<_>>();
        assert_eq!(points, mesh.vertices());
    }

    #[test]
    fn washer_has_two_loops() {
        let mesh = washer();
        let outlines = outlines_of(&mesh).unwrap();

        assert_eq!(outlines.len(), 2);
        let mut lens = outlines.outlines().iter().map(Outline::len).collect::<Vec<_>>();
        lens.sort();
        assert_eq!(lens, vec![4, 4]);

        let outer = sources(&outlines, &outlines.outlines()[0]);
        assert_eq!(outer, vec![0, 1, 2, 3]);
        let mut inner = sources(&outlines, &outlines.outlines()[1]);
        inner.sort();
        assert_eq!(inner, vec![4, 5, 6, 7]);
    }

    #[test]
    fn ids_are_unique_across_outlines() {
        let outlines = outlines_of(&washer()).unwrap();
        let ids = outlines
            .outlines()
            .iter()
            .flat_map(|x| x.vertices().iter().copied())
            .collect::<Vec<_>>();

        assert_eq!(ids, (0..8).collect::<Vec<_>>());
        assert_eq!(outlines.vertex_count(), 8);
    }

    #[test]
    fn closed_surface_gives_nothing() {
        let vertices = vec![Pos::zeros(), Pos::x(), Pos::y(), Pos::z()];
        let faces = vec![vec![0, 2, 1], vec![0, 1, 3], vec![1, 2, 3], vec![2, 0, 3]];
        let mesh = Mesh::new(vertices, faces).unwrap();

        let outlines = outlines_of(&mesh).unwrap();
        assert!(outlines.is_empty());
    }

    #[test]
    fn dangling_edge_is_open() {
        let mesh = square();
        let mut boundary = boundary_edges(&mesh).unwrap();
        boundary.push(Edge {
            vertices: [2, 9],
            faces: 1,
        });

        assert!(matches!(
            assemble(&mesh, &boundary),
            Err(ExportError::OpenBoundary { .. })
        ));
    }

    #[test]
    fn missing_edge_is_open() {
        let mesh = square();
        let mut boundary = boundary_edges(&mesh).unwrap();
        boundary.remove(1);

        assert!(matches!(
            assemble(&mesh, &boundary),
            Err(ExportError::OpenBoundary { .. })
        ));
    }

    #[test]
    fn bowtie_closes_at_seed() {
        // two triangles touching at vertex 0
        let vertices = vec![
            Pos::zeros(),
            Pos::new(1.0, -1.0, 0.0),
            Pos::new(1.0, 1.0, 0.0),
            Pos::new(-1.0, 1.0, 0.0),
            Pos::new(-1.0, -1.0, 0.0),
        ];
        let faces = vec![vec![0, 1, 2], vec![0, 3, 4]];
        let mesh = Mesh::new(vertices, faces).unwrap();

        let outlines = outlines_of(&mesh).unwrap();
        assert_eq!(outlines.len(), 2);
        assert_eq!(outlines.vertex_count(), 6);
    }

    /// Two triangulated unit squares touching at vertex 2.
    fn corner_squares(faces: Vec<Vec<u32>>) -> Mesh {
        let vertices = [
            (0.0, 0.0),
            (1.0, 0.0),
            (1.0, 1.0),
            (0.0, 1.0),
            (2.0, 1.0),
            (2.0, 2.0),
            (1.0, 2.0),
        ]
        .iter()
        .map(|&(x, y)| Pos::new(x, y, 0.0))
        .collect();
        Mesh::new(vertices, faces).unwrap()
    }

    fn loop_sources(outlines: &Outlines<Pos>) -> Vec<Vec<u32>> {
        let mut loops = outlines
            .outlines()
            .iter()
            .map(|x| {
                let mut sources = sources(outlines, x);
                sources.sort();
                sources
            })
            .collect::<Vec<_>>();
        loops.sort();
        loops
    }

    #[test]
    fn touching_loops_split_whatever_the_face_order() {
        let grouped = corner_squares(vec![
            vec![0, 1, 2],
            vec![0, 2, 3],
            vec![2, 4, 5],
            vec![2, 5, 6],
        ]);
        let interleaved = corner_squares(vec![
            vec![0, 1, 2],
            vec![2, 4, 5],
            vec![0, 2, 3],
            vec![2, 5, 6],
        ]);

        let expected = vec![vec![0, 1, 2, 3], vec![2, 4, 5, 6]];
        assert_eq!(loop_sources(&outlines_of(&grouped).unwrap()), expected);
        assert_eq!(loop_sources(&outlines_of(&interleaved).unwrap()), expected);
    }

    #[test]
    fn split_loop_keeps_walk_order() {
        let mesh = corner_squares(vec![
            vec![0, 1, 2],
            vec![2, 4, 5],
            vec![0, 2, 3],
            vec![2, 5, 6],
        ]);
        let outlines = outlines_of(&mesh).unwrap();

        for outline in outlines.outlines() {
            assert_eq!(outline.len(), 4);
            for (a, b) in outline.edges() {
                let (a, b) = (outlines.source(a), outlines.source(b));
                let edge = [a.min(b), a.max(b)];
                assert!(
                    [[0, 1], [1, 2], [2, 3], [0, 3], [2, 4], [4, 5], [5, 6], [2, 6]]
                        .contains(&edge),
                    "{edge:?} is not a boundary edge"
                );
            }
        }
    }

    #[test]
    fn edges_wrap_around() {
        let outlines = outlines_of(&square()).unwrap();
        let edges = outlines.outlines()[0].edges().collect::<Vec<_>>();
        assert_eq!(edges, vec![(0, 1), (1, 2), (2, 3), (3, 0)]);
    }

    proptest! {
        #[test]
        fn fan_rim_is_one_cycle(n in 3_u32..200) {
            let mesh = fan(n);
            let outlines = outlines_of(&mesh).unwrap();
            prop_assert_eq!(outlines.len(), 1);

            let outline = &outlines.outlines()[0];
            prop_assert_eq!(outline.len(), n as usize);

            // consecutive vertices must be neighbours on the rim
            for (a, b) in outline.edges() {
                let (a, b) = (outlines.source(a) - 1, outlines.source(b) - 1);
                prop_assert!((a + 1) % n == b || (b + 1) % n == a);
            }
        }
    }
}
