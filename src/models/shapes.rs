use serde::{Deserialize, Serialize};

/// Geographic point: `x` is longitude, `y` is latitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn longitude(&self) -> f64 {
        self.x
    }

    pub fn latitude(&self) -> f64 {
        self.y
    }
}

/// Closed ring of points. The closing point may or may not repeat the first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinearRing {
    pub points: Vec<Point>,
}

impl LinearRing {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Vertices without the repeated closing point.
    fn vertices(&self) -> &[Point] {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) if self.points.len() > 1 && first == last => {
                &self.points[..self.points.len() - 1]
            }
            _ => &self.points,
        }
    }

    /// Even-odd ray casting. Points exactly on an edge may land on either side.
    pub fn contains(&self, point: &Point) -> bool {
        let vertices = self.vertices();
        if vertices.len() < 3 {
            return false;
        }

        let mut inside = false;
        let mut j = vertices.len() - 1;
        for i in 0..vertices.len() {
            let a = vertices[i];
            let b = vertices[j];
            if (a.y > point.y) != (b.y > point.y) {
                let crossing_x = (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x;
                if point.x < crossing_x {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }

    /// Shoelace signed area (positive when counter-clockwise).
    pub fn signed_area(&self) -> f64 {
        let vertices = self.vertices();
        if vertices.len() < 3 {
            return 0.0;
        }
        let mut twice_area = 0.0;
        for (i, a) in vertices.iter().enumerate() {
            let b = vertices[(i + 1) % vertices.len()];
            twice_area += a.x * b.y - b.x * a.y;
        }
        twice_area / 2.0
    }

    /// Area-weighted centroid; `None` for degenerate rings.
    pub fn centroid(&self) -> Option<Point> {
        let vertices = self.vertices();
        let area = self.signed_area();
        if vertices.len() < 3 || area == 0.0 {
            return None;
        }

        // Shift to the first vertex to keep the products small for lat/lon inputs.
        let origin = vertices[0];
        let (mut cx, mut cy) = (0.0, 0.0);
        for (i, a) in vertices.iter().enumerate() {
            let b = vertices[(i + 1) % vertices.len()];
            let (ax, ay) = (a.x - origin.x, a.y - origin.y);
            let (bx, by) = (b.x - origin.x, b.y - origin.y);
            let cross = ax * by - bx * ay;
            cx += (ax + bx) * cross;
            cy += (ay + by) * cross;
        }
        let factor = 1.0 / (6.0 * area);
        Some(Point::new(origin.x + cx * factor, origin.y + cy * factor))
    }
}

/// One exterior ring and zero or more non-overlapping holes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub exterior_ring: LinearRing,
    #[serde(default)]
    pub interior_rings: Vec<LinearRing>,
}

impl Polygon {
    pub fn new(exterior_ring: LinearRing) -> Self {
        Self {
            exterior_ring,
            interior_rings: Vec::new(),
        }
    }

    pub fn with_hole(mut self, ring: LinearRing) -> Self {
        self.interior_rings.push(ring);
        self
    }

    pub fn contains(&self, point: &Point) -> bool {
        self.exterior_ring.contains(point)
            && !self.interior_rings.iter().any(|hole| hole.contains(point))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MultiPolygon {
    pub polygons: Vec<Polygon>,
}

impl MultiPolygon {
    pub fn new(polygons: Vec<Polygon>) -> Self {
        Self { polygons }
    }

    pub fn contains(&self, point: &Point) -> bool {
        self.polygons.iter().any(|p| p.contains(point))
    }
}

impl From<Polygon> for MultiPolygon {
    fn from(polygon: Polygon) -> Self {
        Self {
            polygons: vec![polygon],
        }
    }
}

/// Helper for building rings from `(lon, lat)` pairs.
pub fn ring(coords: &[(f64, f64)]) -> LinearRing {
    LinearRing::new(coords.iter().map(|&(x, y)| Point::new(x, y)).collect())
}
