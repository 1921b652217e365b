//! Rectangular cropping of point clouds.

use crate::config::Thresholds;
use crate::core::scan::PointCloud;

/// Keep the points inside `thresholds`, in their original order.
///
/// The bounds are closed and only x and y are constrained. The source cloud is
/// left untouched; a new cloud is returned.
pub fn filter_cloud(cloud: &PointCloud, thresholds: &Thresholds) -> PointCloud {
    cloud
        .points()
        .filter(|p| thresholds.contains(p.x, p.y))
        .collect()
}

/// Indices of the points inside `thresholds`.
///
/// Useful for re-deriving alignment between two clouds after cropping.
pub fn retained_indices(cloud: &PointCloud, thresholds: &Thresholds) -> Vec<usize> {
    cloud
        .points()
        .enumerate()
        .filter(|(_, p)| thresholds.contains(p.x, p.y))
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> Thresholds {
        Thresholds::new(0.0, 10.0, -5.0, 5.0)
    }

    #[test]
    fn test_consecutive_out_of_bounds_points_are_all_removed() {
        // in, out, out, in, out, in, in
        let cloud = PointCloud::from_xyz(
            vec![1.0, 11.0, -1.0, 2.0, 3.0, 4.0, 5.0],
            vec![0.0, 0.0, 0.0, 1.0, 9.0, 2.0, 3.0],
            vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7],
        );

        let filtered = filter_cloud(&cloud, &bounds());

        assert_eq!(filtered.x, vec![1.0, 2.0, 4.0, 5.0]);
        assert_eq!(filtered.y, vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(filtered.z, vec![0.1, 0.4, 0.6, 0.7]);
        // Source is unchanged
        assert_eq!(cloud.len(), 7);
    }

    #[test]
    fn test_leading_run_of_out_of_bounds_points() {
        let cloud = PointCloud::from_xyz(
            vec![-1.0, -2.0, -3.0, 1.0],
            vec![0.0, 0.0, 0.0, 0.0],
            vec![0.0, 0.0, 0.0, 0.0],
        );
        let filtered = filter_cloud(&cloud, &bounds());
        assert_eq!(filtered.x, vec![1.0]);
    }

    #[test]
    fn test_bounds_are_inclusive_and_z_is_free() {
        let cloud = PointCloud::from_xyz(
            vec![0.0, 10.0, 5.0],
            vec![-5.0, 5.0, 0.0],
            vec![-1000.0, 1000.0, f64::MAX],
        );
        let filtered = filter_cloud(&cloud, &bounds());
        assert_eq!(filtered.len(), 3);
    }

    #[test]
    fn test_all_points_removed() {
        let cloud = PointCloud::from_xyz(vec![20.0, 30.0], vec![0.0, 0.0], vec![0.0, 0.0]);
        assert!(filter_cloud(&cloud, &bounds()).is_empty());
    }

    #[test]
    fn test_empty_cloud() {
        assert!(filter_cloud(&PointCloud::new(), &bounds()).is_empty());
    }

    #[test]
    fn test_retained_indices() {
        let cloud = PointCloud::from_xyz(
            vec![1.0, 11.0, 12.0, 2.0],
            vec![0.0, 0.0, 0.0, 0.0],
            vec![0.0, 0.0, 0.0, 0.0],
        );
        assert_eq!(retained_indices(&cloud, &bounds()), vec![0, 3]);
    }
}
