//! Decoded scan entities: point clouds, scans and the scan dataset.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDateTime;
use rayon::prelude::*;

use crate::config::{Axis, LidarSide, Thresholds};
use crate::processors::filtering::filter_cloud;

/// A single LIDAR return in vehicle coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Container for 3D point cloud data, one point per angular sample.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PointCloud {
    /// X coordinates of all points.
    pub x: Vec<f64>,
    /// Y coordinates of all points.
    pub y: Vec<f64>,
    /// Z coordinates of all points.
    pub z: Vec<f64>,
}

impl PointCloud {
    /// Creates a new empty point cloud.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new point cloud with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            x: Vec::with_capacity(capacity),
            y: Vec::with_capacity(capacity),
            z: Vec::with_capacity(capacity),
        }
    }

    /// Creates a new point cloud from coordinate vectors.
    pub fn from_xyz(x: Vec<f64>, y: Vec<f64>, z: Vec<f64>) -> Self {
        debug_assert!(x.len() == y.len() && y.len() == z.len());
        Self { x, y, z }
    }

    /// Returns the number of points in the cloud.
    #[inline]
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// Returns true if the point cloud is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Adds a point to the cloud.
    #[inline]
    pub fn push(&mut self, x: f64, y: f64, z: f64) {
        self.x.push(x);
        self.y.push(y);
        self.z.push(z);
    }

    pub fn get(&self, index: usize) -> Option<Point3> {
        if index < self.len() {
            Some(Point3::new(self.x[index], self.y[index], self.z[index]))
        } else {
            None
        }
    }

    /// Iterates over the points in sample order.
    pub fn points(&self) -> impl Iterator<Item = Point3> + '_ {
        self.x
            .iter()
            .zip(&self.y)
            .zip(&self.z)
            .map(|((&x, &y), &z)| Point3::new(x, y, z))
    }

    /// All values of one coordinate, in sample order.
    #[inline]
    pub fn axis(&self, axis: Axis) -> &[f64] {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
            Axis::Z => &self.z,
        }
    }

    /// Converts point cloud to a vector of [x, y, z] coordinate arrays.
    pub fn to_coords(&self) -> Vec<[f64; 3]> {
        self.points().map(|p| [p.x, p.y, p.z]).collect()
    }
}

impl FromIterator<Point3> for PointCloud {
    fn from_iter<I: IntoIterator<Item = Point3>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut cloud = PointCloud::with_capacity(iter.size_hint().0);
        for p in iter {
            cloud.push(p.x, p.y, p.z);
        }
        cloud
    }
}

/// Vehicle state and both LIDAR sweeps for one time instant.
#[derive(Debug, Clone, PartialEq)]
pub struct Scan {
    /// (latitude, longitude)
    pub gps: (f64, f64),
    pub heading: f64,
    /// Row 3 of the source column, kept verbatim. Its meaning is unknown.
    pub reserved: Option<String>,
    pub velocity: f64,
    pub timestamp: NaiveDateTime,
    pub left: PointCloud,
    pub right: PointCloud,
}

impl Scan {
    pub fn cloud(&self, side: LidarSide) -> &PointCloud {
        match side {
            LidarSide::Left => &self.left,
            LidarSide::Right => &self.right,
        }
    }

    /// One coordinate of one LIDAR's points, e.g. all left-side x values.
    pub fn lidar_axis(&self, side: LidarSide, axis: Axis) -> &[f64] {
        self.cloud(side).axis(axis)
    }

    /// Crops both clouds to `thresholds`.
    ///
    /// The two sides are filtered independently, so `left` and `right` are no
    /// longer index-aligned afterwards.
    pub fn crop(&mut self, thresholds: &Thresholds) {
        self.left = filter_cloud(&self.left, thresholds);
        self.right = filter_cloud(&self.right, thresholds);
    }
}

impl fmt::Display for Scan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Scan taken on {} at latitude {} and longitude {}; heading {}, velocity {} ({} left / {} right points)",
            self.timestamp.format("%Y-%m-%d %H:%M"),
            self.gps.0,
            self.gps.1,
            self.heading,
            self.velocity,
            self.left.len(),
            self.right.len()
        )
    }
}

/// All scans of one recording keyed by contiguous scan index, in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    scans: BTreeMap<usize, Scan>,
}

impl Dataset {
    /// Builds a dataset numbering `scans` from 0 in iteration order.
    pub fn from_scans<I: IntoIterator<Item = Scan>>(scans: I) -> Self {
        Self {
            scans: scans.into_iter().enumerate().collect(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.scans.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.scans.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Scan> {
        self.scans.get(&index)
    }

    /// Iterates `(index, scan)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Scan)> + '_ {
        self.scans.iter().map(|(&i, s)| (i, s))
    }

    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.scans.keys().copied()
    }

    /// Crops every scan in place.
    pub fn crop(&mut self, thresholds: &Thresholds) {
        self.scans
            .par_iter_mut()
            .for_each(|(_, scan)| scan.crop(thresholds));
    }

    pub fn into_scans(self) -> BTreeMap<usize, Scan> {
        self.scans
    }
}
