//! Halfedge meshes stored in index arenas.
//!
//! Halfedges are always allocated in twin pairs: the twin of halfedge `i`
//! is `i ^ 1`. Every halfedge knows its owning vertex (the one it leaves),
//! edge and face. Boundary loops are represented by faces flagged as
//! `boundary`.

use glam::{Vec2, Vec3};

mod build;
mod link;

pub use link::{FlatMesh, MeshRanges, Pools, VertexRecord, flatten, link};

macro_rules! element_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl $name {
            pub(crate) const DANGLING: Self = Self(u32::MAX);

            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

element_id!(HalfedgeId);
element_id!(VertexId);
element_id!(EdgeId);
element_id!(FaceId);

impl HalfedgeId {
    /// The other halfedge of the pair this one was allocated in.
    pub const fn paired(self) -> Self {
        Self(self.0 ^ 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Halfedge {
    pub twin: HalfedgeId,
    pub next: HalfedgeId,
    pub vertex: VertexId,
    pub edge: EdgeId,
    pub face: FaceId,
    pub corner_uv: Vec2,
    pub corner_normal: Vec3,
}

/// Influence of one bone on a skinned vertex.
///
/// `bone` indexes the bones of the skeleton the mesh belongs to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoneWeight {
    pub bone: u32,
    pub weight: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    pub halfedge: HalfedgeId,
    pub position: Vec3,
    pub bone_weights: Vec<BoneWeight>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub halfedge: HalfedgeId,
    pub sharp: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Face {
    pub halfedge: HalfedgeId,
    pub boundary: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Element {
    Vertex,
    Edge,
    Face,
}

impl std::fmt::Display for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Element::Vertex => "vertex",
            Element::Edge => "edge",
            Element::Face => "face",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pool {
    Halfedges,
    Vertices,
    Edges,
    Faces,
    Weights,
}

impl std::fmt::Display for Pool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Pool::Halfedges => "halfedge",
            Pool::Vertices => "vertex",
            Pool::Edges => "edge",
            Pool::Faces => "face",
            Pool::Weights => "weight",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MeshError {
    #[error("{pool} range [{begin},{end}) does not fit in a pool of {len}")]
    BadRange { pool: Pool, begin: u32, end: u32, len: usize },
    #[error("halfedge range [{begin},{end}) is not a fully-twinned set of halfedges")]
    OddHalfedges { begin: u32, end: u32 },
    #[error("halfedge {halfedge} has next {next}, which is outside the mesh")]
    NextOutOfRange { halfedge: u32, next: u32 },
    #[error("two halfedges have the same next ({next})")]
    DuplicateNext { next: u32 },
    #[error("{element} {index} has halfedge {halfedge}, which is outside the mesh")]
    HalfedgeOutOfRange { element: Element, index: u32, halfedge: u32 },
    #[error("halfedge {halfedge} is claimed by two of the mesh's {element} loops")]
    DoubleClaim { element: Element, halfedge: u32 },
    #[error("halfedge {halfedge} does not belong to any {element}")]
    Unclaimed { element: Element, halfedge: u32 },
    #[error("weight references out-of-range bone {bone} (skeleton has {bones})")]
    WeightBone { bone: u32, bones: u32 },
    #[error("halfedge {halfedge} has a dangling {field}")]
    Dangling { halfedge: u32, field: &'static str },
    #[error("{element} {index} has a dangling halfedge")]
    DanglingElement { element: Element, index: u32 },
    #[error("halfedge {halfedge} is not twinned with the other halfedge of its pair")]
    BadTwin { halfedge: u32 },
    #[error("halfedge {halfedge} disagrees with its {what}")]
    Inconsistent { halfedge: u32, what: &'static str },
    #[error("face {face} references vertex {vertex}, but there are only {count} vertices")]
    BadFaceIndex { face: usize, vertex: u32, count: usize },
    #[error("face {face} has fewer than three distinct corners")]
    DegenerateFace { face: usize },
    #[error("edge from {from} to {to} is used twice in the same direction")]
    NonManifoldEdge { from: u32, to: u32 },
    #[error("vertex {vertex} lies on more than one boundary loop")]
    NonManifoldVertex { vertex: u32 },
    #[error("vertex {vertex} is not used by any face")]
    IsolatedVertex { vertex: u32 },
    #[error("mesh has more elements than the format can address")]
    TooLarge,
}

/// Linked halfedge mesh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HalfedgeMesh {
    pub halfedges: Vec<Halfedge>,
    pub vertices: Vec<Vertex>,
    pub edges: Vec<Edge>,
    pub faces: Vec<Face>,
}

impl HalfedgeMesh {
    pub fn halfedge(&self, id: HalfedgeId) -> &Halfedge {
        &self.halfedges[id.index()]
    }

    /// Halfedges around a face, starting at its designated halfedge.
    pub fn face_halfedges(&self, face: FaceId) -> impl Iterator<Item = HalfedgeId> + '_ {
        let start = self.faces[face.index()].halfedge;
        let mut current = Some(start);
        std::iter::from_fn(move || {
            let h = current?;
            let next = self.halfedge(h).next;
            current = (next != start).then_some(next);
            Some(h)
        })
    }

    /// Number of faces that are not boundary loops.
    pub fn interior_face_count(&self) -> usize {
        self.faces.iter().filter(|f| !f.boundary).count()
    }

    /// Check the linking invariants: ids in range, twins paired, `next` a
    /// permutation, and every element agreeing with its halfedges.
    pub fn validate(&self) -> Result<(), MeshError> {
        let n = self.halfedges.len();
        if n % 2 != 0 {
            return Err(MeshError::OddHalfedges { begin: 0, end: n as u32 });
        }
        let mut has_prev = vec![false; n];
        for (i, h) in self.halfedges.iter().enumerate() {
            let index = i as u32;
            let dangling = |field| MeshError::Dangling { halfedge: index, field };
            if h.twin.index() >= n {
                return Err(dangling("twin"));
            }
            if h.next.index() >= n {
                return Err(dangling("next"));
            }
            if h.vertex.index() >= self.vertices.len() {
                return Err(dangling("vertex"));
            }
            if h.edge.index() >= self.edges.len() {
                return Err(dangling("edge"));
            }
            if h.face.index() >= self.faces.len() {
                return Err(dangling("face"));
            }
            if h.twin != HalfedgeId(index).paired() {
                return Err(MeshError::BadTwin { halfedge: index });
            }
            if std::mem::replace(&mut has_prev[h.next.index()], true) {
                return Err(MeshError::DuplicateNext { next: h.next.0 });
            }
        }
        for (i, h) in self.halfedges.iter().enumerate() {
            let index = i as u32;
            let inconsistent = |what| MeshError::Inconsistent { halfedge: index, what };
            let twin = self.halfedge(h.twin);
            let next = self.halfedge(h.next);
            if twin.edge != h.edge {
                return Err(inconsistent("twin's edge"));
            }
            if next.vertex != twin.vertex {
                return Err(inconsistent("next's vertex"));
            }
            if next.face != h.face {
                return Err(inconsistent("next's face"));
            }
        }
        check_elements(self, Element::Vertex, |m, h| m.halfedge(m.halfedge(h).twin).next)?;
        check_elements(self, Element::Edge, |m, h| m.halfedge(h).twin)?;
        check_elements(self, Element::Face, |m, h| m.halfedge(h).next)?;
        Ok(())
    }
}

/// Circulate every element of one kind and make sure the loops cover each
/// halfedge exactly once.
fn check_elements(
    mesh: &HalfedgeMesh,
    element: Element,
    step: impl Fn(&HalfedgeMesh, HalfedgeId) -> HalfedgeId,
) -> Result<(), MeshError> {
    let designated: Vec<HalfedgeId> = match element {
        Element::Vertex => mesh.vertices.iter().map(|v| v.halfedge).collect(),
        Element::Edge => mesh.edges.iter().map(|e| e.halfedge).collect(),
        Element::Face => mesh.faces.iter().map(|f| f.halfedge).collect(),
    };
    let owner = |h: &Halfedge| match element {
        Element::Vertex => h.vertex.0,
        Element::Edge => h.edge.0,
        Element::Face => h.face.0,
    };
    let mut claimed = vec![false; mesh.halfedges.len()];
    for (i, start) in designated.into_iter().enumerate() {
        let index = i as u32;
        if start.index() >= mesh.halfedges.len() {
            return Err(MeshError::DanglingElement { element, index });
        }
        let mut h = start;
        loop {
            if owner(mesh.halfedge(h)) != index {
                return Err(MeshError::Inconsistent {
                    halfedge: h.0,
                    what: "owning element",
                });
            }
            if std::mem::replace(&mut claimed[h.index()], true) {
                return Err(MeshError::DoubleClaim { element, halfedge: h.0 });
            }
            h = step(mesh, h);
            if h == start {
                break;
            }
        }
    }
    match claimed.iter().position(|c| !c) {
        Some(h) => Err(MeshError::Unclaimed { element, halfedge: h as u32 }),
        None => Ok(()),
    }
}
