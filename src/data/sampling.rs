//! Random measurement positions inside a disc, and visiting order.

use crate::geometry::Point;
use rand::Rng;
use std::f64::consts::TAU;

/// Draws attempted before giving up on reaching the requested count.
pub const MAX_DRAWS: usize = 8000;
/// Closest two accepted samples may be, in mm.
pub const MIN_SPACING_MM: f64 = 0.1;

/// Order in which generated points are returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TourOrder {
    /// Generation order.
    #[default]
    AsDrawn,
    /// Greedy nearest-neighbour tour starting at the origin.
    NearestNeighbour,
}

/// Up to `count` points uniformly distributed over a disc of `radius`.
///
/// Fewer points are returned when the spacing rule keeps rejecting draws.
pub fn uniform_disc<R: Rng + ?Sized>(count: usize, radius: f64, rng: &mut R) -> Vec<Point> {
    let mut points: Vec<Point> = Vec::with_capacity(count);

    for _ in 0..MAX_DRAWS {
        if points.len() >= count {
            break;
        }
        let angle = rng.gen::<f64>() * TAU;
        // sqrt keeps the density uniform over area
        let magnitude = radius * rng.gen::<f64>().sqrt();
        let candidate = Point::planar(magnitude * angle.cos(), magnitude * angle.sin());

        if points
            .iter()
            .all(|p| p.distance_to(&candidate) >= MIN_SPACING_MM)
        {
            points.push(candidate);
        }
    }
    points
}

/// Greedy tour: always go to the closest unvisited point.
///
/// On equal distances the later point in `points` wins.
pub fn nearest_neighbour_order(mut points: Vec<Point>, start: Point) -> Vec<Point> {
    let mut tour = Vec::with_capacity(points.len());
    let mut current = start;

    while !points.is_empty() {
        let mut nearest = 0;
        let mut best = f64::INFINITY;
        for (i, p) in points.iter().enumerate() {
            let d = p.distance_to(&current);
            if d <= best {
                nearest = i;
                best = d;
            }
        }
        current = points.remove(nearest);
        tour.push(current);
    }
    tour
}

/// Sample `count` points in a disc and order them for visiting.
pub fn generate<R: Rng + ?Sized>(
    count: usize,
    radius: f64,
    order: TourOrder,
    rng: &mut R,
) -> Vec<Point> {
    let points = uniform_disc(count, radius, rng);
    match order {
        TourOrder::AsDrawn => points,
        TourOrder::NearestNeighbour => nearest_neighbour_order(points, Point::ORIGIN),
    }
}
