pub mod annotation;
pub mod cad;
pub mod compliance;
pub mod detection;
pub mod errors;
pub mod geometry;
pub mod record;
pub mod spacing;
