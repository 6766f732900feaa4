//! Conversion between linked meshes and the flat record pools of a file.

use std::ops::Range;

use glam::{Vec2, Vec3};

use super::*;
use crate::records;

/// Vertex records that can be linked into a mesh.
pub trait VertexRecord: Copy {
    fn halfedge(&self) -> u32;
    fn position(&self) -> Vec3;
}

impl VertexRecord for records::Vertex {
    fn halfedge(&self) -> u32 {
        self.halfedge
    }

    fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }
}

impl VertexRecord for records::SkinnedVertex {
    fn halfedge(&self) -> u32 {
        self.halfedge
    }

    fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }
}

/// The element pools shared by every mesh of one kind in a file.
#[derive(Debug, Clone, Copy)]
pub struct Pools<'a, V> {
    pub halfedges: &'a [records::Halfedge],
    pub vertices: &'a [V],
    pub edges: &'a [records::Edge],
    pub faces: &'a [records::Face],
}

/// Where one mesh lives in the pools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshRanges {
    pub halfedges: Range<u32>,
    pub vertices: Range<u32>,
    pub edges: Range<u32>,
    pub faces: Range<u32>,
}

/// Owned pools being filled while saving.
#[derive(Debug, Clone)]
pub struct FlatMesh<V> {
    pub halfedges: Vec<records::Halfedge>,
    pub vertices: Vec<V>,
    pub edges: Vec<records::Edge>,
    pub faces: Vec<records::Face>,
}

impl<V> Default for FlatMesh<V> {
    fn default() -> Self {
        Self {
            halfedges: Vec::new(),
            vertices: Vec::new(),
            edges: Vec::new(),
            faces: Vec::new(),
        }
    }
}

impl<V> FlatMesh<V> {
    pub fn pools(&self) -> Pools<'_, V> {
        Pools {
            halfedges: &self.halfedges,
            vertices: &self.vertices,
            edges: &self.edges,
            faces: &self.faces,
        }
    }
}

pub(crate) fn sub_slice<'a, T>(
    pool: &'a [T],
    range: &Range<u32>,
    which: Pool,
) -> Result<&'a [T], MeshError> {
    let (begin, end) = (range.start, range.end);
    if begin > end || end as usize > pool.len() {
        return Err(MeshError::BadRange {
            pool: which,
            begin,
            end,
            len: pool.len(),
        });
    }
    Ok(&pool[begin as usize..end as usize])
}

/// Build a linked mesh from the pool entries in `ranges`.
///
/// `weights` is called once per vertex record in order and supplies its
/// bone weights. The result is either fully linked or an error; every
/// halfedge must end up owned by exactly one vertex, edge and face.
pub fn link<V: VertexRecord>(
    pools: &Pools<'_, V>,
    ranges: &MeshRanges,
    mut weights: impl FnMut(&V) -> Result<Vec<BoneWeight>, MeshError>,
) -> Result<HalfedgeMesh, MeshError> {
    let hs = sub_slice(pools.halfedges, &ranges.halfedges, Pool::Halfedges)?;
    let vs = sub_slice(pools.vertices, &ranges.vertices, Pool::Vertices)?;
    let es = sub_slice(pools.edges, &ranges.edges, Pool::Edges)?;
    let fs = sub_slice(pools.faces, &ranges.faces, Pool::Faces)?;

    let base = ranges.halfedges.start;
    if hs.len() % 2 != 0 {
        return Err(MeshError::OddHalfedges {
            begin: ranges.halfedges.start,
            end: ranges.halfedges.end,
        });
    }
    let n = hs.len();
    let local = |global: u32| {
        ranges
            .halfedges
            .contains(&global)
            .then(|| (global - base) as usize)
    };

    let mut next = Vec::with_capacity(n);
    let mut has_prev = vec![false; n];
    for (i, rec) in hs.iter().enumerate() {
        let target = rec.next;
        let Some(l) = local(target) else {
            return Err(MeshError::NextOutOfRange {
                halfedge: base + i as u32,
                next: target,
            });
        };
        if std::mem::replace(&mut has_prev[l], true) {
            return Err(MeshError::DuplicateNext { next: target });
        }
        next.push(l);
    }
    let twin = |h: usize| h ^ 1;

    // Circulate from each element's halfedge, recording the owner of every
    // halfedge visited.
    let claim = |element: Element,
                 designated: &mut dyn Iterator<Item = u32>,
                 first_index: u32,
                 step: &dyn Fn(usize) -> usize|
     -> Result<Vec<u32>, MeshError> {
        let mut owner = vec![u32::MAX; n];
        for (i, global) in designated.enumerate() {
            let Some(start) = local(global) else {
                return Err(MeshError::HalfedgeOutOfRange {
                    element,
                    index: first_index + i as u32,
                    halfedge: global,
                });
            };
            let mut h = start;
            loop {
                if owner[h] != u32::MAX {
                    return Err(MeshError::DoubleClaim {
                        element,
                        halfedge: base + h as u32,
                    });
                }
                owner[h] = i as u32;
                h = step(h);
                if h == start {
                    break;
                }
            }
        }
        if let Some(h) = owner.iter().position(|&o| o == u32::MAX) {
            return Err(MeshError::Unclaimed {
                element,
                halfedge: base + h as u32,
            });
        }
        Ok(owner)
    };

    let vertex_of = claim(
        Element::Vertex,
        &mut vs.iter().map(|v| v.halfedge()),
        ranges.vertices.start,
        &|h| next[twin(h)],
    )?;
    let edge_of = claim(
        Element::Edge,
        &mut es.iter().map(|e| e.halfedge),
        ranges.edges.start,
        &twin,
    )?;
    let face_of = claim(
        Element::Face,
        &mut fs.iter().map(|f| f.halfedge),
        ranges.faces.start,
        &|h| next[h],
    )?;

    let halfedges = hs
        .iter()
        .enumerate()
        .map(|(i, rec)| Halfedge {
            twin: HalfedgeId(twin(i) as u32),
            next: HalfedgeId(next[i] as u32),
            vertex: VertexId(vertex_of[i]),
            edge: EdgeId(edge_of[i]),
            face: FaceId(face_of[i]),
            corner_uv: Vec2::from_array(rec.corner_uv),
            corner_normal: Vec3::from_array(rec.corner_normal),
        })
        .collect();
    let to_local = |global: u32| HalfedgeId(global - base);
    let vertices = vs
        .iter()
        .map(|rec| {
            Ok(Vertex {
                halfedge: to_local(rec.halfedge()),
                position: rec.position(),
                bone_weights: weights(rec)?,
            })
        })
        .collect::<Result<_, MeshError>>()?;
    let edges = es
        .iter()
        .map(|rec| Edge {
            halfedge: to_local(rec.halfedge),
            sharp: rec.sharp == records::Edge::SHARP,
        })
        .collect();
    let faces = fs
        .iter()
        .map(|rec| Face {
            halfedge: to_local(rec.halfedge),
            boundary: rec.boundary == records::Face::BOUNDARY,
        })
        .collect();

    Ok(HalfedgeMesh {
        halfedges,
        vertices,
        edges,
        faces,
    })
}

fn index_u32(len: usize) -> Result<u32, MeshError> {
    u32::try_from(len).map_err(|_| MeshError::TooLarge)
}

/// Append `mesh` to `out`, returning where it was placed.
///
/// Halfedges are written in twin pairs, so a mesh that came out of [`link`]
/// is written back in the same order. `vertex` converts each vertex, given
/// the file index of its halfedge.
pub fn flatten<V>(
    mesh: &HalfedgeMesh,
    out: &mut FlatMesh<V>,
    mut vertex: impl FnMut(&Vertex, u32) -> Result<V, MeshError>,
) -> Result<MeshRanges, MeshError> {
    mesh.validate()?;

    let base = index_u32(out.halfedges.len())?;
    let n = mesh.halfedges.len();
    index_u32(out.halfedges.len() + n)?;

    // File position of every halfedge, assigned pair by pair.
    let mut slot = vec![u32::MAX; n];
    let mut order = Vec::with_capacity(n);
    for (i, h) in mesh.halfedges.iter().enumerate() {
        if slot[i] != u32::MAX {
            continue;
        }
        let at = order.len() as u32;
        slot[i] = at;
        slot[h.twin.index()] = at + 1;
        order.push(i);
        order.push(h.twin.index());
    }
    let file = |h: HalfedgeId| base + slot[h.index()];

    let start = |len: usize| index_u32(len);
    let halfedges_begin = base;
    out.halfedges.extend(order.iter().map(|&i| {
        let h = &mesh.halfedges[i];
        records::Halfedge {
            next: file(h.next),
            corner_uv: h.corner_uv.to_array(),
            corner_normal: h.corner_normal.to_array(),
        }
    }));

    let vertices_begin = start(out.vertices.len())?;
    for v in &mesh.vertices {
        let rec = vertex(v, file(v.halfedge))?;
        out.vertices.push(rec);
    }
    let edges_begin = start(out.edges.len())?;
    out.edges.extend(mesh.edges.iter().map(|e| records::Edge {
        halfedge: file(e.halfedge),
        sharp: if e.sharp {
            records::Edge::SHARP
        } else {
            records::Edge::SMOOTH
        },
    }));
    let faces_begin = start(out.faces.len())?;
    out.faces.extend(mesh.faces.iter().map(|f| records::Face {
        halfedge: file(f.halfedge),
        boundary: if f.boundary {
            records::Face::BOUNDARY
        } else {
            records::Face::SURFACE
        },
    }));

    Ok(MeshRanges {
        halfedges: halfedges_begin..base + n as u32,
        vertices: vertices_begin..start(out.vertices.len())?,
        edges: edges_begin..start(out.edges.len())?,
        faces: faces_begin..start(out.faces.len())?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain_vertex(v: &Vertex, halfedge: u32) -> Result<records::Vertex, MeshError> {
        Ok(records::Vertex {
            halfedge,
            position: v.position.to_array(),
        })
    }

    fn no_weights(_: &records::Vertex) -> Result<Vec<BoneWeight>, MeshError> {
        Ok(Vec::new())
    }

    fn flat_cube() -> (FlatMesh<records::Vertex>, MeshRanges) {
        let mut flat = FlatMesh::default();
        let ranges = flatten(&HalfedgeMesh::cube(1.0), &mut flat, plain_vertex).unwrap();
        (flat, ranges)
    }

    #[test]
    fn flatten_then_link_is_identity() {
        let cube = HalfedgeMesh::cube(0.5);
        let mut flat = FlatMesh::default();
        // Put something in front so ranges do not start at zero.
        flatten(&HalfedgeMesh::cube(2.0), &mut flat, plain_vertex).unwrap();
        let ranges = flatten(&cube, &mut flat, plain_vertex).unwrap();
        assert_eq!(ranges.halfedges, 24..48);
        assert_eq!(ranges.faces, 6..12);
        let linked = link(&flat.pools(), &ranges, no_weights).unwrap();
        assert_eq!(linked, cube);
    }

    #[test]
    fn odd_halfedge_range() {
        let (flat, mut ranges) = flat_cube();
        ranges.halfedges.end -= 1;
        let err = link(&flat.pools(), &ranges, no_weights).unwrap_err();
        assert!(matches!(err, MeshError::OddHalfedges { .. }));
    }

    #[test]
    fn range_past_pool_end() {
        let (flat, mut ranges) = flat_cube();
        ranges.vertices.end = 100;
        let err = link(&flat.pools(), &ranges, no_weights).unwrap_err();
        assert!(matches!(err, MeshError::BadRange { pool: Pool::Vertices, .. }));
    }

    #[test]
    fn shared_next_is_rejected() {
        let (mut flat, ranges) = flat_cube();
        let stolen = flat.halfedges[0].next;
        flat.halfedges[2].next = stolen;
        let err = link(&flat.pools(), &ranges, no_weights).unwrap_err();
        assert_eq!(err, MeshError::DuplicateNext { next: stolen });
    }

    #[test]
    fn next_outside_mesh() {
        let (mut flat, ranges) = flat_cube();
        flat.halfedges[5].next = 24;
        let err = link(&flat.pools(), &ranges, no_weights).unwrap_err();
        assert_eq!(err, MeshError::NextOutOfRange { halfedge: 5, next: 24 });
    }

    #[test]
    fn two_faces_claiming_one_loop() {
        let (mut flat, ranges) = flat_cube();
        flat.faces[1].halfedge = flat.faces[0].halfedge;
        let err = link(&flat.pools(), &ranges, no_weights).unwrap_err();
        assert!(matches!(
            err,
            MeshError::DoubleClaim { element: Element::Face, .. }
        ));
    }

    #[test]
    fn vertex_halfedge_out_of_range() {
        let (mut flat, ranges) = flat_cube();
        flat.vertices[3].halfedge = 999;
        let err = link(&flat.pools(), &ranges, no_weights).unwrap_err();
        assert_eq!(
            err,
            MeshError::HalfedgeOutOfRange {
                element: Element::Vertex,
                index: 3,
                halfedge: 999,
            }
        );
    }

    #[test]
    fn missing_face_leaves_halfedges_unclaimed() {
        let (mut flat, mut ranges) = flat_cube();
        flat.faces.pop();
        ranges.faces.end -= 1;
        let err = link(&flat.pools(), &ranges, no_weights).unwrap_err();
        assert!(matches!(
            err,
            MeshError::Unclaimed { element: Element::Face, .. }
        ));
    }

    #[test]
    fn weights_are_collected_per_vertex() {
        let (flat, ranges) = flat_cube();
        let mut calls = 0;
        let mesh = link(&flat.pools(), &ranges, |_| {
            calls += 1;
            Ok(vec![BoneWeight { bone: 0, weight: 1.0 }])
        })
        .unwrap();
        assert_eq!(calls, 8);
        assert!(mesh.vertices.iter().all(|v| v.bone_weights.len() == 1));
    }

    #[test]
    fn only_one_means_sharp_or_boundary() {
        let (mut flat, ranges) = flat_cube();
        flat.edges[0].sharp = records::Edge::SHARP;
        flat.edges[1].sharp = 2;
        flat.faces[0].boundary = 0xff;
        let mesh = link(&flat.pools(), &ranges, no_weights).unwrap();
        assert!(mesh.edges[0].sharp);
        assert!(!mesh.edges[1].sharp);
        assert!(!mesh.faces[0].boundary);
    }
}
