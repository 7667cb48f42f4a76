//! Point-list input/output and sample generation.

pub mod csv_points;
pub mod sampling;

pub use csv_points::{load_points, read_points, save_points, write_points};
pub use sampling::{generate, nearest_neighbour_order, uniform_disc, TourOrder};
