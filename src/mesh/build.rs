use glam::{Vec2, Vec3};

use super::*;
use crate::HashMap;

impl HalfedgeMesh {
    /// Build a mesh from polygons given as loops of vertex indices.
    ///
    /// Open borders get boundary faces. Faces with repeated consecutive
    /// corners are dropped; every vertex must be used by some face.
    pub fn from_indexed_faces(
        positions: &[Vec3],
        faces: &[Vec<u32>],
    ) -> Result<Self, MeshError> {
        let mut mesh = HalfedgeMesh {
            vertices: positions
                .iter()
                .map(|&position| Vertex {
                    halfedge: HalfedgeId::DANGLING,
                    position,
                    bone_weights: Vec::new(),
                })
                .collect(),
            ..Default::default()
        };

        let mut directed: HashMap<(u32, u32), HalfedgeId> = HashMap::default();
        for (fi, corners) in faces.iter().enumerate() {
            if let Some(&vertex) = corners.iter().find(|&&v| v as usize >= positions.len()) {
                return Err(MeshError::BadFaceIndex {
                    face: fi,
                    vertex,
                    count: positions.len(),
                });
            }
            let n = corners.len();
            if (0..n).any(|i| corners[i] == corners[(i + 1) % n]) {
                continue;
            }
            if n < 3 {
                return Err(MeshError::DegenerateFace { face: fi });
            }

            let face = FaceId(mesh.faces.len() as u32);
            let mut loop_halfedges = Vec::with_capacity(n);
            for i in 0..n {
                let (a, b) = (corners[i], corners[(i + 1) % n]);
                if directed.contains_key(&(a, b)) {
                    return Err(MeshError::NonManifoldEdge { from: a, to: b });
                }
                let h = match directed.get(&(b, a)) {
                    Some(&opposite) => opposite.paired(),
                    None => {
                        let edge = EdgeId(mesh.edges.len() as u32);
                        let h = HalfedgeId(mesh.halfedges.len() as u32);
                        mesh.edges.push(Edge { halfedge: h, sharp: false });
                        for twin in [h.paired(), h] {
                            mesh.halfedges.push(Halfedge {
                                twin,
                                next: HalfedgeId::DANGLING,
                                vertex: VertexId::DANGLING,
                                edge,
                                face: FaceId::DANGLING,
                                corner_uv: Vec2::ZERO,
                                corner_normal: Vec3::ZERO,
                            });
                        }
                        h
                    }
                };
                directed.insert((a, b), h);
                let he = &mut mesh.halfedges[h.index()];
                he.vertex = VertexId(a);
                he.face = face;
                let v = &mut mesh.vertices[a as usize];
                if v.halfedge == HalfedgeId::DANGLING {
                    v.halfedge = h;
                }
                loop_halfedges.push(h);
            }
            for i in 0..n {
                let next = loop_halfedges[(i + 1) % n];
                mesh.halfedges[loop_halfedges[i].index()].next = next;
            }
            mesh.faces.push(Face {
                halfedge: loop_halfedges[0],
                boundary: false,
            });
        }

        mesh.close_boundaries()?;

        if let Some(v) = mesh.vertices.iter().position(|v| v.halfedge == HalfedgeId::DANGLING) {
            return Err(MeshError::IsolatedVertex { vertex: v as u32 });
        }
        Ok(mesh)
    }

    /// Give every unused halfedge slot a place on a boundary loop.
    fn close_boundaries(&mut self) -> Result<(), MeshError> {
        let open: Vec<HalfedgeId> = (0..self.halfedges.len() as u32)
            .map(HalfedgeId)
            .filter(|&h| self.halfedge(h).face == FaceId::DANGLING)
            .collect();

        // An open halfedge runs from the tip of its twin back to the twin's
        // origin.
        let mut leaving: HashMap<u32, HalfedgeId> = HashMap::default();
        for &h in &open {
            let twin = self.halfedge(h).twin;
            let tip_of_twin = self.halfedge(self.halfedge(twin).next).vertex;
            self.halfedges[h.index()].vertex = tip_of_twin;
            if leaving.insert(tip_of_twin.0, h).is_some() {
                return Err(MeshError::NonManifoldVertex { vertex: tip_of_twin.0 });
            }
        }
        for &h in &open {
            let twin = self.halfedge(h).twin;
            let end = self.halfedge(twin).vertex;
            let Some(&next) = leaving.get(&end.0) else {
                return Err(MeshError::NonManifoldVertex { vertex: end.0 });
            };
            self.halfedges[h.index()].next = next;
        }

        for &h in &open {
            if self.halfedge(h).face != FaceId::DANGLING {
                continue;
            }
            let face = FaceId(self.faces.len() as u32);
            self.faces.push(Face {
                halfedge: h,
                boundary: true,
            });
            let mut current = h;
            loop {
                self.halfedges[current.index()].face = face;
                current = self.halfedge(current).next;
                if current == h {
                    break;
                }
            }
        }
        Ok(())
    }

    /// Axis aligned cube centered on the origin, with all edges sharp.
    pub fn cube(half_size: f32) -> Self {
        let r = half_size;
        let positions = [
            Vec3::new(-r, -r, -r),
            Vec3::new(r, -r, -r),
            Vec3::new(-r, r, -r),
            Vec3::new(r, r, -r),
            Vec3::new(-r, -r, r),
            Vec3::new(r, -r, r),
            Vec3::new(-r, r, r),
            Vec3::new(r, r, r),
        ];
        let faces = [
            vec![0, 2, 3, 1],
            vec![4, 5, 7, 6],
            vec![0, 1, 5, 4],
            vec![1, 3, 7, 5],
            vec![3, 2, 6, 7],
            vec![2, 0, 4, 6],
        ];
        let Ok(mut mesh) = Self::from_indexed_faces(&positions, &faces) else {
            unreachable!("cube faces form a closed manifold");
        };
        for edge in &mut mesh.edges {
            edge.sharp = true;
        }
        mesh
    }
}
