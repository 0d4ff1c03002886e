// Floating point comparisons, and the offset used for over/under points
pub const EPSILON: f64 = 0.0001;

// Materials compare more loosely than geometry
pub const MATERIAL_EPSILON: f64 = 0.001;

// Default number of reflection/refraction bounces per camera ray
pub const MAX_RECURSION_DEPTH: usize = 5;

// Common refraction indices
pub const VACUUM_RI: f64 = 1.0;
pub const AIR_RI: f64 = 1.00029;
pub const WATER_RI: f64 = 1.333;
pub const GLASS_RI: f64 = 1.52;
pub const DIAMOND_RI: f64 = 2.417;
