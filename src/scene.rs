//! Scene graph: placed primitives, their hierarchy, and ray queries against them.

use glam::DVec3;

/// Identifies a node placed in the [`SceneGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Ray with a unit-length direction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: DVec3,
    pub direction: DVec3,
}

impl Ray {
    pub fn new(origin: DVec3, direction: DVec3) -> Self {
        Ray {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    pub fn at(&self, distance: f64) -> DVec3 {
        self.origin + self.direction * distance
    }
}

/// 8-bit RGB colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const fn hex(value: u32) -> Self {
        Rgb((value >> 16) as u8, (value >> 8) as u8, value as u8)
    }
}

/// Surface appearance of a primitive
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub color: Rgb,
    pub opacity: f64,
    /// Unlit materials ignore scene lighting
    pub lit: bool,
}

impl Material {
    pub fn lit(color: Rgb) -> Self {
        Material {
            color,
            opacity: 1.0,
            lit: true,
        }
    }

    pub fn unlit(color: Rgb) -> Self {
        Material {
            color,
            opacity: 1.0,
            lit: false,
        }
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }
}

impl Default for Material {
    fn default() -> Self {
        Material::lit(Rgb(255, 255, 255))
    }
}

/// Renderable primitive, centred on its node's origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Sphere { radius: f64, segments: u32 },
    Cuboid { half_extents: DVec3 },
    /// Flat rectangle in the local XY plane, facing +Z
    Panel { half_width: f64, half_height: f64 },
}

/// Translation plus rotation about the vertical axis
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Transform {
    pub translation: DVec3,
    pub yaw: f64,
}

impl Transform {
    pub fn at(translation: DVec3) -> Self {
        Transform {
            translation,
            yaw: 0.0,
        }
    }

    pub fn rotate(&self, v: DVec3) -> DVec3 {
        let (sin, cos) = self.yaw.sin_cos();
        DVec3::new(v.x * cos + v.z * sin, v.y, -v.x * sin + v.z * cos)
    }

    pub fn unrotate(&self, v: DVec3) -> DVec3 {
        let (sin, cos) = self.yaw.sin_cos();
        DVec3::new(v.x * cos - v.z * sin, v.y, v.x * sin + v.z * cos)
    }

    pub fn to_world(&self, local: DVec3) -> DVec3 {
        self.translation + self.rotate(local)
    }

    pub fn to_local(&self, world: DVec3) -> DVec3 {
        self.unrotate(world - self.translation)
    }

    /// Applies `child` inside this transform's frame
    pub fn then(&self, child: &Transform) -> Transform {
        Transform {
            translation: self.to_world(child.translation),
            yaw: self.yaw + child.yaw,
        }
    }
}

/// A placed element: a group when it has no shape, a mesh otherwise
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub parent: Option<NodeId>,
    pub transform: Transform,
    pub shape: Option<Shape>,
    pub material: Material,
    pub interactive: bool,
    /// Exhibit bound to this node, by content store index
    pub exhibit: Option<usize>,
}

impl Node {
    pub fn group(transform: Transform) -> Self {
        Node {
            parent: None,
            transform,
            shape: None,
            material: Material::default(),
            interactive: false,
            exhibit: None,
        }
    }

    pub fn mesh(shape: Shape, material: Material, translation: DVec3) -> Self {
        Node {
            parent: None,
            transform: Transform::at(translation),
            shape: Some(shape),
            material,
            interactive: false,
            exhibit: None,
        }
    }

    pub fn child_of(mut self, parent: NodeId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn bound_to(mut self, exhibit: usize) -> Self {
        self.interactive = true;
        self.exhibit = Some(exhibit);
        self
    }
}

/// Result of a ray query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub node: NodeId,
    pub distance: f64,
}

/// A shape resolved into world space, ready to draw
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drawable {
    pub node: NodeId,
    pub transform: Transform,
    pub shape: Shape,
    pub material: Material,
}

#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: Vec<Option<Node>>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn place(&mut self, node: Node) -> NodeId {
        self.nodes.push(Some(node));
        NodeId(self.nodes.len() - 1)
    }

    /// Removes a node together with everything below it
    pub fn remove(&mut self, id: NodeId) {
        let children: Vec<NodeId> = self.children(id).collect();
        for child in children {
            self.remove(child);
        }
        if let Some(slot) = self.nodes.get_mut(id.0) {
            *slot = None;
        }
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    pub fn set_transform(&mut self, id: NodeId, transform: Transform) {
        if let Some(Some(node)) = self.nodes.get_mut(id.0) {
            node.transform = transform;
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.iter().flatten().count()
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(move |(index, node)| match node {
                Some(node) if node.parent == Some(id) => Some(NodeId(index)),
                _ => None,
            })
    }

    /// Walks parents up to the top-level node
    pub fn root_of(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(parent) = self.get(current).and_then(|node| node.parent) {
            current = parent;
        }
        current
    }

    pub fn world_transform(&self, id: NodeId) -> Transform {
        let Some(node) = self.get(id) else {
            return Transform::default();
        };
        match node.parent {
            Some(parent) => self.world_transform(parent).then(&node.transform),
            None => node.transform,
        }
    }

    /// Every shaped node in world space
    pub fn drawables(&self) -> Vec<Drawable> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(index, node)| {
                let node = node.as_ref()?;
                let shape = node.shape?;
                let id = NodeId(index);
                Some(Drawable {
                    node: id,
                    transform: self.world_transform(id),
                    shape,
                    material: node.material,
                })
            })
            .collect()
    }

    /// Nearest hit among the candidates and all their descendants
    pub fn intersect_nearest(&self, ray: &Ray, candidates: &[NodeId]) -> Option<Hit> {
        let mut nearest: Option<Hit> = None;
        let mut pending: Vec<NodeId> = candidates.to_vec();
        while let Some(id) = pending.pop() {
            let Some(node) = self.get(id) else {
                continue;
            };
            if let Some(shape) = node.shape {
                let transform = self.world_transform(id);
                let local = Ray {
                    origin: transform.to_local(ray.origin),
                    direction: transform.unrotate(ray.direction),
                };
                if let Some(distance) = intersect_shape(&local, &shape) {
                    if nearest.map_or(true, |hit| distance < hit.distance) {
                        nearest = Some(Hit { node: id, distance });
                    }
                }
            }
            pending.extend(self.children(id));
        }
        nearest
    }
}

/// Distance along a local-space ray to a shape, if it is hit in front of the origin
pub fn intersect_shape(ray: &Ray, shape: &Shape) -> Option<f64> {
    match *shape {
        Shape::Sphere { radius, .. } => intersect_sphere(ray, radius),
        Shape::Cuboid { half_extents } => intersect_cuboid(ray, half_extents),
        Shape::Panel {
            half_width,
            half_height,
        } => intersect_panel(ray, half_width, half_height),
    }
}

fn intersect_sphere(ray: &Ray, radius: f64) -> Option<f64> {
    let b = ray.origin.dot(ray.direction);
    let c = ray.origin.length_squared() - radius * radius;
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }
    let root = discriminant.sqrt();
    [-b - root, -b + root].into_iter().find(|&t| t > 0.0)
}

fn intersect_cuboid(ray: &Ray, half_extents: DVec3) -> Option<f64> {
    let mut t_min = f64::NEG_INFINITY;
    let mut t_max = f64::INFINITY;
    for axis in 0..3 {
        let origin = ray.origin[axis];
        let direction = ray.direction[axis];
        let extent = half_extents[axis];
        if direction.abs() < 1e-12 {
            if origin < -extent || origin > extent {
                return None;
            }
            continue;
        }
        let t0 = (-extent - origin) / direction;
        let t1 = (extent - origin) / direction;
        t_min = t_min.max(t0.min(t1));
        t_max = t_max.min(t0.max(t1));
        if t_min > t_max {
            return None;
        }
    }
    if t_min > 0.0 {
        Some(t_min)
    } else if t_max > 0.0 {
        Some(t_max)
    } else {
        None
    }
}

fn intersect_panel(ray: &Ray, half_width: f64, half_height: f64) -> Option<f64> {
    if ray.direction.z.abs() < 1e-12 {
        return None;
    }
    let t = -ray.origin.z / ray.direction.z;
    if t <= 0.0 {
        return None;
    }
    let point = ray.at(t);
    (point.x.abs() <= half_width && point.y.abs() <= half_height).then_some(t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    fn sphere(radius: f64) -> Shape {
        Shape::Sphere {
            radius,
            segments: 8,
        }
    }

    #[test]
    fn sphere_hit_from_outside() {
        let ray = Ray::new(DVec3::new(0.0, 0.0, 10.0), DVec3::NEG_Z);
        assert_relative_eq!(intersect_shape(&ray, &sphere(2.0)).unwrap(), 8.0);
    }

    #[test]
    fn sphere_behind_ray_is_missed() {
        let ray = Ray::new(DVec3::new(0.0, 0.0, 10.0), DVec3::Z);
        assert!(intersect_shape(&ray, &sphere(2.0)).is_none());
    }

    #[test]
    fn cuboid_hit_on_near_face() {
        let shape = Shape::Cuboid {
            half_extents: DVec3::new(1.0, 0.5, 2.0),
        };
        let ray = Ray::new(DVec3::new(0.0, 0.0, 5.0), DVec3::NEG_Z);
        assert_relative_eq!(intersect_shape(&ray, &shape).unwrap(), 3.0);
    }

    #[test]
    fn cuboid_parallel_ray_outside_slab_misses() {
        let shape = Shape::Cuboid {
            half_extents: DVec3::splat(1.0),
        };
        let ray = Ray::new(DVec3::new(0.0, 3.0, 5.0), DVec3::NEG_Z);
        assert!(intersect_shape(&ray, &shape).is_none());
    }

    #[test]
    fn panel_respects_extent() {
        let shape = Shape::Panel {
            half_width: 1.0,
            half_height: 1.0,
        };
        let hit = Ray::new(DVec3::new(0.5, 0.5, 4.0), DVec3::NEG_Z);
        let miss = Ray::new(DVec3::new(1.5, 0.0, 4.0), DVec3::NEG_Z);
        assert_relative_eq!(intersect_shape(&hit, &shape).unwrap(), 4.0);
        assert!(intersect_shape(&miss, &shape).is_none());
    }

    #[test]
    fn transform_round_trips_points() {
        let transform = Transform {
            translation: DVec3::new(3.0, 1.0, -2.0),
            yaw: 0.7,
        };
        let point = DVec3::new(1.0, 2.0, 3.0);
        let back = transform.to_local(transform.to_world(point));
        assert_relative_eq!(back.x, point.x, epsilon = 1e-12);
        assert_relative_eq!(back.y, point.y, epsilon = 1e-12);
        assert_relative_eq!(back.z, point.z, epsilon = 1e-12);
    }

    #[test]
    fn quarter_turn_maps_forward_to_left() {
        let transform = Transform {
            translation: DVec3::ZERO,
            yaw: FRAC_PI_2,
        };
        let turned = transform.rotate(DVec3::NEG_Z);
        assert_relative_eq!(turned.x, -1.0, epsilon = 1e-12);
        assert_relative_eq!(turned.z, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn nearest_hit_walks_descendants() {
        let mut scene = SceneGraph::new();
        let group = scene.place(Node::group(Transform::at(DVec3::new(0.0, 0.0, -5.0))).bound_to(0));
        let near = scene.place(
            Node::mesh(sphere(0.5), Material::default(), DVec3::new(0.0, 0.0, 1.0)).child_of(group),
        );
        scene.place(Node::mesh(sphere(0.5), Material::default(), DVec3::ZERO).child_of(group));

        let ray = Ray::new(DVec3::ZERO, DVec3::NEG_Z);
        let hit = scene.intersect_nearest(&ray, &[group]).unwrap();
        assert_eq!(hit.node, near);
        assert_relative_eq!(hit.distance, 3.5);
        assert_eq!(scene.root_of(hit.node), group);
    }

    #[test]
    fn child_transforms_compose_with_parent() {
        let mut scene = SceneGraph::new();
        let group = scene.place(Node::group(Transform {
            translation: DVec3::new(10.0, 0.0, 0.0),
            yaw: FRAC_PI_2,
        }));
        let child = scene.place(
            Node::mesh(sphere(1.0), Material::default(), DVec3::new(0.0, 0.0, -2.0))
                .child_of(group),
        );
        let world = scene.world_transform(child).translation;
        assert_relative_eq!(world.x, 8.0, epsilon = 1e-12);
        assert_relative_eq!(world.z, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn remove_drops_subtree() {
        let mut scene = SceneGraph::new();
        let group = scene.place(Node::group(Transform::default()));
        let child = scene.place(
            Node::mesh(sphere(1.0), Material::default(), DVec3::ZERO).child_of(group),
        );
        let other = scene.place(Node::group(Transform::default()));
        scene.remove(group);
        assert!(scene.get(group).is_none());
        assert!(scene.get(child).is_none());
        assert!(scene.get(other).is_some());
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn removed_nodes_are_not_hit() {
        let mut scene = SceneGraph::new();
        let target = scene.place(Node::mesh(sphere(1.0), Material::default(), DVec3::new(0.0, 0.0, -5.0)));
        scene.remove(target);
        let ray = Ray::new(DVec3::ZERO, DVec3::NEG_Z);
        assert!(scene.intersect_nearest(&ray, &[target]).is_none());
    }
}
