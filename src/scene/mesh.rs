use std::sync::Arc;
use std::{fs, path::Path};

use rand::Rng;
use thiserror::Error;

use crate::geometry::{Aabb, FloatType, HitRecord, Ray, WorldPoint};
use crate::material::Material;
use crate::scene::bvh::Bvh;
use crate::scene::primitives::Triangle;
use crate::scene::{Primitive, SceneBuildError};

/// A mesh that cannot be loaded aborts scene construction; missing geometry
/// has no usable fallback.
#[derive(Debug, Error)]
pub enum MeshLoadError {
    #[error("failed to read OBJ file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse OBJ file: {0}")]
    Parse(#[from] wavefront_obj::ParseError),
    #[error(transparent)]
    Build(#[from] SceneBuildError),
}

/// Triangle soup behind its own BVH. Face normals come from vertex winding,
/// computed once at construction.
pub struct TriangleMesh {
    bvh: Bvh<Triangle>,
}

impl TriangleMesh {
    pub fn from_obj(
        path: impl AsRef<Path>,
        material: Arc<dyn Material>,
        rng: &mut impl Rng,
    ) -> Result<TriangleMesh, MeshLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_obj_source(content, material, rng)
    }

    pub fn from_obj_source(
        source: String,
        material: Arc<dyn Material>,
        rng: &mut impl Rng,
    ) -> Result<TriangleMesh, MeshLoadError> {
        let parsed = wavefront_obj::obj::parse(source)?;
        let (vertices, faces) = collect_faces(parsed);
        Ok(Self::new(vertices, faces, material, rng)?)
    }

    /// Builds a mesh from raw vertex/face records. All triangles share the
    /// one material.
    pub fn new(
        vertices: Vec<WorldPoint>,
        faces: Vec<[usize; 3]>,
        material: Arc<dyn Material>,
        rng: &mut impl Rng,
    ) -> Result<TriangleMesh, SceneBuildError> {
        let triangle_count = faces.len();
        let triangles = faces
            .into_iter()
            .map(|face| {
                let [a, b, c] = face.map(|index| {
                    vertices
                        .get(index)
                        .copied()
                        .ok_or(SceneBuildError::FaceIndexOutOfRange {
                            index,
                            vertex_count: vertices.len(),
                        })
                });
                Ok(Triangle::new(a?, b?, c?, Arc::clone(&material)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let bvh = Bvh::build(triangles, rng)?;
        log::info!("loaded mesh with {triangle_count} triangles");
        Ok(TriangleMesh { bvh })
    }

    pub fn triangle_count(&self) -> usize {
        self.bvh.len()
    }
}

impl Primitive for TriangleMesh {
    fn intersect<'a>(
        &'a self,
        ray: &Ray,
        hit: &mut HitRecord<'a>,
        t_min: FloatType,
        t_max: FloatType,
    ) -> bool {
        self.bvh.intersect(ray, hit, t_min, t_max)
    }

    fn bounding_box(&self) -> Option<Aabb> {
        self.bvh.bounding_box()
    }
}

fn collect_faces(obj: wavefront_obj::obj::ObjSet) -> (Vec<WorldPoint>, Vec<[usize; 3]>) {
    let mut vertices = Vec::new();
    let mut faces = Vec::new();

    for object in obj.objects {
        // OBJ vertex indices are per-object in this parser
        let base = vertices.len();
        vertices.extend(object.vertices.iter().map(|v| {
            WorldPoint::new(v.x as FloatType, v.y as FloatType, v.z as FloatType)
        }));

        for geometry in object.geometry {
            for shape in geometry.shapes {
                let wavefront_obj::obj::Primitive::Triangle(a, b, c) = shape.primitive else {
                    log::warn!("skipping non-triangle OBJ primitive");
                    continue;
                };
                faces.push([base + a.0, base + b.0, base + c.0]);
            }
        }
    }

    (vertices, faces)
}
