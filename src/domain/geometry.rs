// src/domain/geometry.rs
//! Geometría de la sección de pilar: envolvente convexa (cerco exterior)
//! y trazado de las horquillas interiores.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Punto en coordenadas de imagen (píxeles).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Orden total (x, luego y). Usa el orden IEEE para que el resultado
    /// sea idéntico entre ejecuciones.
    fn total_cmp(&self, other: &Self) -> Ordering {
        self.x
            .total_cmp(&other.x)
            .then_with(|| self.y.total_cmp(&other.y))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TieOrientation {
    Horizontal,
    Vertical,
}

/// Horquilla interior: une una barra interior con el cerco opuesto.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TieSegment {
    pub from: Point2D,
    pub to: Point2D,
    #[serde(rename = "type")]
    pub orientation: TieOrientation,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HoopPath {
    pub outer_hoop: Vec<Point2D>,
    pub inner_ties: Vec<TieSegment>,
}

/// Producto cruzado OA x OB. > 0 giro antihorario, < 0 horario, 0 colineal.
pub fn cross(o: Point2D, a: Point2D, b: Point2D) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

pub fn distance(a: Point2D, b: Point2D) -> f64 {
    ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
}

/// Envolvente convexa por cadena monótona (Andrew).
///
/// Devuelve los vértices en sentido antihorario empezando por el de menor
/// x (y menor y en empate), sin repetir el primero al final. Los puntos
/// colineales sobre una arista se descartan.
pub fn convex_hull(points: &[Point2D]) -> Vec<Point2D> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let mut sorted = points.to_vec();
    sorted.sort_by(Point2D::total_cmp);
    sorted.dedup_by(|a, b| a.total_cmp(b) == Ordering::Equal);

    if sorted.len() < 3 {
        return sorted;
    }

    let mut lower: Vec<Point2D> = Vec::with_capacity(sorted.len());
    for &p in &sorted {
        while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0.0 {
            lower.pop();
        }
        lower.push(p);
    }

    let mut upper: Vec<Point2D> = Vec::with_capacity(sorted.len());
    for &p in sorted.iter().rev() {
        while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0.0 {
            upper.pop();
        }
        upper.push(p);
    }

    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

/// Ray casting (par-impar). Un punto exactamente sobre una arista puede
/// quedar a cualquiera de los dos lados.
pub fn point_in_polygon(point: Point2D, polygon: &[Point2D]) -> bool {
    let n = polygon.len();
    if n == 0 {
        return false;
    }

    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (pi, pj) = (polygon[i], polygon[j]);
        if (pi.y > point.y) != (pj.y > point.y)
            && point.x < (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Puntos que no son vértices de la envolvente (igualdad exacta).
pub fn find_interior_points(all_points: &[Point2D], hull: &[Point2D]) -> Vec<Point2D> {
    all_points
        .iter()
        .filter(|p| !hull.contains(p))
        .copied()
        .collect()
}

/// Cerco exterior + horquillas interiores a partir de los centros detectados.
///
/// Heurística para secciones aproximadamente rectangulares: cada barra
/// interior se ata con una horquilla horizontal o vertical según hacia qué
/// eje se aleja más del centro de la caja envolvente. Con |dx| == |dy| se
/// elige vertical; el empate es arbitrario y no tiene significado estructural.
pub fn generate_hoop_path(centers: &[Point2D]) -> HoopPath {
    if centers.len() < 3 {
        return HoopPath::default();
    }

    let hull = convex_hull(centers);
    let inner = find_interior_points(centers, &hull);

    let mut inner_ties = Vec::with_capacity(inner.len());
    if !inner.is_empty() && !hull.is_empty() {
        let (min_x, max_x, min_y, max_y) = bounding_box(&hull);
        let cx = (min_x + max_x) / 2.0;
        let cy = (min_y + max_y) / 2.0;

        for p in inner {
            let tie = if (p.x - cx).abs() > (p.y - cy).abs() {
                TieSegment {
                    from: Point2D::new(min_x, p.y),
                    to: Point2D::new(max_x, p.y),
                    orientation: TieOrientation::Horizontal,
                }
            } else {
                TieSegment {
                    from: Point2D::new(p.x, min_y),
                    to: Point2D::new(p.x, max_y),
                    orientation: TieOrientation::Vertical,
                }
            };
            inner_ties.push(tie);
        }
    }

    HoopPath {
        outer_hoop: hull,
        inner_ties,
    }
}

fn bounding_box(points: &[Point2D]) -> (f64, f64, f64, f64) {
    points.iter().fold(
        (f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY),
        |(min_x, max_x, min_y, max_y), p| {
            (min_x.min(p.x), max_x.max(p.x), min_y.min(p.y), max_y.max(p.y))
        },
    )
}
