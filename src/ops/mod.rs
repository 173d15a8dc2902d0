pub mod adjustments;
pub mod transform;
