// src/domain/spacing.rs
//! Clasificación de separaciones entre barras contiguas.

use serde::{Deserialize, Serialize};

use super::geometry::{distance, Point2D};

/// Tipo de elemento. Cualquier valor desconocido queda sin clasificar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentType {
    SlabWall,
    BeamColumn,
    Unclassified,
}

impl ComponentType {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "slab_wall" => Self::SlabWall,
            "beam_column" => Self::BeamColumn,
            _ => Self::Unclassified,
        }
    }
}

/// Separaciones de proyecto en mm.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpacingTargets {
    pub single: f64,
    pub dense: f64,
    pub sparse: f64,
    pub tolerance: f64,
}

impl Default for SpacingTargets {
    fn default() -> Self {
        Self {
            single: 150.0,
            dense: 100.0,
            sparse: 200.0,
            tolerance: 20.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpacingStatus {
    Pass,
    PassDense,
    PassSparse,
    Fail,
}

impl SpacingStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Pass => "合格",
            Self::PassDense => "加密区合格",
            Self::PassSparse => "非加密区合格",
            Self::Fail => "不合格",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Self::Pass | Self::PassSparse => "#00e676",
            Self::PassDense => "#00e5ff",
            Self::Fail => "#ff1744",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpacingSegment {
    pub index: usize,
    pub start: Point2D,
    pub end: Point2D,
    pub px_distance: f64,
    pub mm_distance: f64,
    /// `None` cuando el tipo de elemento no admite clasificación.
    pub status: Option<SpacingStatus>,
    pub label: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpacingSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub unclassified: usize,
}

impl SpacingSummary {
    pub fn from_segments(segments: &[SpacingSegment]) -> Self {
        segments.iter().fold(
            Self {
                total: segments.len(),
                ..Self::default()
            },
            |mut acc, seg| {
                match seg.status {
                    Some(SpacingStatus::Fail) => acc.failed += 1,
                    Some(_) => acc.passed += 1,
                    None => acc.unclassified += 1,
                }
                acc
            },
        )
    }
}

/// Ordena los centros por el eje dominante y clasifica cada tramo contiguo.
///
/// Un resultado vacío significa "no calculable" (menos de dos barras o
/// escala no positiva), nunca "conforme".
pub fn classify_spacing(
    centers: &[Point2D],
    component: ComponentType,
    pixels_per_mm: f64,
    targets: &SpacingTargets,
) -> Vec<SpacingSegment> {
    // NaN también queda fuera.
    if centers.len() < 2 || !(pixels_per_mm > 0.0) {
        return Vec::new();
    }

    let mut sorted = centers.to_vec();
    if axis_range(&sorted, |p| p.x) >= axis_range(&sorted, |p| p.y) {
        sorted.sort_by(|a, b| a.x.total_cmp(&b.x));
    } else {
        sorted.sort_by(|a, b| a.y.total_cmp(&b.y));
    }

    sorted
        .windows(2)
        .enumerate()
        .map(|(index, pair)| {
            let (start, end) = (pair[0], pair[1]);
            let px_distance = distance(start, end);
            let mm_distance = px_distance / pixels_per_mm;
            let status = classify(component, mm_distance, targets);
            // Se clasifica con el valor exacto; lo devuelto va a un decimal.
            SpacingSegment {
                index,
                start: Point2D::new(round1(start.x), round1(start.y)),
                end: Point2D::new(round1(end.x), round1(end.y)),
                px_distance: round1(px_distance),
                mm_distance: round1(mm_distance),
                status,
                label: status.map(|s| s.label().to_string()),
                color: status.map(|s| s.color().to_string()),
            }
        })
        .collect()
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

fn classify(component: ComponentType, mm: f64, targets: &SpacingTargets) -> Option<SpacingStatus> {
    match component {
        ComponentType::SlabWall => Some(if (mm - targets.single).abs() <= targets.tolerance {
            SpacingStatus::Pass
        } else {
            SpacingStatus::Fail
        }),
        ComponentType::BeamColumn => {
            // La zona densa manda cuando ambas ventanas se solapan.
            if (mm - targets.dense).abs() <= targets.tolerance {
                Some(SpacingStatus::PassDense)
            } else if (mm - targets.sparse).abs() <= targets.tolerance {
                Some(SpacingStatus::PassSparse)
            } else {
                Some(SpacingStatus::Fail)
            }
        }
        ComponentType::Unclassified => None,
    }
}

fn axis_range(points: &[Point2D], coord: impl Fn(&Point2D) -> f64) -> f64 {
    let (min, max) = points.iter().map(coord).fold(
        (f64::INFINITY, f64::NEG_INFINITY),
        |(min, max), v| (min.min(v), max.max(v)),
    );
    max - min
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_x(xs: &[f64]) -> Vec<Point2D> {
        xs.iter().map(|&x| Point2D::new(x, 10.0)).collect()
    }

    #[test]
    fn slab_row_at_target_passes() {
        let segs = classify_spacing(
            &row_x(&[300.0, 0.0, 150.0]),
            ComponentType::SlabWall,
            1.0,
            &SpacingTargets::default(),
        );
        assert_eq!(segs.len(), 2);
        for (i, seg) in segs.iter().enumerate() {
            assert_eq!(seg.index, i);
            assert_eq!(seg.mm_distance, 150.0);
            assert_eq!(seg.status, Some(SpacingStatus::Pass));
            assert_eq!(seg.label.as_deref(), Some("合格"));
        }
        assert_eq!(segs[0].start.x, 0.0);
        assert_eq!(segs[1].end.x, 300.0);
    }

    #[test]
    fn slab_tolerance_boundaries_are_inclusive() {
        let targets = SpacingTargets::default();
        let segs = classify_spacing(&row_x(&[0.0, 130.0, 300.0, 471.0]), ComponentType::SlabWall, 1.0, &targets);
        let statuses: Vec<_> = segs.iter().map(|s| s.status).collect();
        assert_eq!(
            statuses,
            vec![Some(SpacingStatus::Pass), Some(SpacingStatus::Pass), Some(SpacingStatus::Fail)]
        );
    }

    #[test]
    fn scale_converts_pixels_to_mm() {
        let segs = classify_spacing(&row_x(&[0.0, 300.0]), ComponentType::SlabWall, 2.0, &SpacingTargets::default());
        assert_eq!(segs[0].px_distance, 300.0);
        assert_eq!(segs[0].mm_distance, 150.0);
    }

    #[test]
    fn vertical_runs_sort_by_y() {
        let centers = vec![Point2D::new(5.0, 200.0), Point2D::new(6.0, 0.0), Point2D::new(5.0, 100.0)];
        let segs = classify_spacing(&centers, ComponentType::BeamColumn, 1.0, &SpacingTargets::default());
        assert_eq!(segs[0].start, Point2D::new(6.0, 0.0));
        assert_eq!(segs[1].end, Point2D::new(5.0, 200.0));
    }

    #[test]
    fn beam_zones_classify_dense_sparse_and_fail() {
        let segs = classify_spacing(
            &row_x(&[0.0, 100.0, 300.0, 450.0]),
            ComponentType::BeamColumn,
            1.0,
            &SpacingTargets::default(),
        );
        let statuses: Vec<_> = segs.iter().filter_map(|s| s.status).collect();
        assert_eq!(
            statuses,
            vec![SpacingStatus::PassDense, SpacingStatus::PassSparse, SpacingStatus::Fail]
        );
        assert_eq!(segs[0].color.as_deref(), Some("#00e5ff"));
    }

    #[test]
    fn dense_zone_wins_when_windows_overlap() {
        let targets = SpacingTargets {
            dense: 100.0,
            sparse: 130.0,
            tolerance: 20.0,
            ..SpacingTargets::default()
        };
        let segs = classify_spacing(&row_x(&[0.0, 115.0]), ComponentType::BeamColumn, 1.0, &targets);
        assert_eq!(segs[0].status, Some(SpacingStatus::PassDense));
    }

    #[test]
    fn unknown_component_leaves_segments_unclassified() {
        assert_eq!(ComponentType::parse("column"), ComponentType::Unclassified);
        let segs = classify_spacing(&row_x(&[0.0, 150.0]), ComponentType::parse("column"), 1.0, &SpacingTargets::default());
        assert_eq!(segs.len(), 1);
        assert_eq!(segs[0].status, None);
        assert_eq!(segs[0].label, None);
        assert_eq!(
            SpacingSummary::from_segments(&segs),
            SpacingSummary { total: 1, passed: 0, failed: 0, unclassified: 1 }
        );
    }

    #[test]
    fn degenerate_inputs_are_not_computable() {
        let targets = SpacingTargets::default();
        assert!(classify_spacing(&row_x(&[0.0]), ComponentType::SlabWall, 1.0, &targets).is_empty());
        assert!(classify_spacing(&row_x(&[0.0, 150.0]), ComponentType::SlabWall, 0.0, &targets).is_empty());
        assert!(classify_spacing(&row_x(&[0.0, 150.0]), ComponentType::SlabWall, -1.0, &targets).is_empty());
        assert!(classify_spacing(&row_x(&[0.0, 150.0]), ComponentType::SlabWall, f64::NAN, &targets).is_empty());
    }

    #[test]
    fn summary_counts_pass_and_fail() {
        let segs = classify_spacing(
            &row_x(&[0.0, 150.0, 300.0, 500.0]),
            ComponentType::SlabWall,
            1.0,
            &SpacingTargets::default(),
        );
        assert_eq!(
            SpacingSummary::from_segments(&segs),
            SpacingSummary { total: 3, passed: 2, failed: 1, unclassified: 0 }
        );
    }

    #[test]
    fn reported_values_are_rounded_but_classified_exactly() {
        // 170.04 mm queda fuera de 150 ± 20 aunque se muestre como 170.0.
        let centers = vec![Point2D::new(0.04, 10.26), Point2D::new(170.08, 10.26)];
        let segs = classify_spacing(&centers, ComponentType::SlabWall, 1.0, &SpacingTargets::default());
        assert_eq!(segs[0].start, Point2D::new(0.0, 10.3));
        assert_eq!(segs[0].end, Point2D::new(170.1, 10.3));
        assert_eq!(segs[0].px_distance, 170.0);
        assert_eq!(segs[0].mm_distance, 170.0);
        assert_eq!(segs[0].status, Some(SpacingStatus::Fail));

        let segs = classify_spacing(&row_x(&[0.0, 100.0]), ComponentType::SlabWall, 3.0, &SpacingTargets::default());
        assert_eq!(segs[0].mm_distance, 33.3);
    }

    #[test]
    fn status_serializes_snake_case() {
        assert_eq!(serde_json::to_value(SpacingStatus::PassDense).unwrap(), "pass_dense");
    }
}
