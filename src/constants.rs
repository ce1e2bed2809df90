//! # Constants and type definitions for distslice
//!
//! This module centralizes the **physical constants**, **angle conversions**, the
//! **numerical tolerances** shared by the slicing pipeline, and the unit type aliases
//! used across the crate.
//!
//! ## Units
//!
//! - Energies are in eV, velocities in km/s and particle masses in eV/(km/s)².
//!   With these units the rest energy is simply `mass · VLIGHT²`.
//! - Angles handed to and returned by the public API are in **degrees**.
//! - Times are float seconds (UNIX seconds when converted from [`hifitime::Epoch`]).

// -------------------------------------------------------------------------------------------------
// Physical constants and unit conversions
// -------------------------------------------------------------------------------------------------

/// Speed of light in km/s
pub const VLIGHT: f64 = 2.99792458e5;

/// Degrees → radians
pub const RADEG: f64 = std::f64::consts::PI / 180.0;

/// Radians → degrees
pub const DEGRAD: f64 = 180.0 / std::f64::consts::PI;

/// Proton mass in eV/(km/s)²
pub const PROTON_MASS: f64 = 0.010439684;

/// Electron mass in eV/(km/s)²
pub const ELECTRON_MASS: f64 = 5.6856300e-6;

// -------------------------------------------------------------------------------------------------
// Numerical tolerances
// -------------------------------------------------------------------------------------------------

/// Grid and bin thetas closer than this (degrees) to an integer are snapped onto it
pub const ANGLE_SNAP_TOL: f64 = 1e-6;

/// Below this norm a cross product is treated as zero (parallel reference vectors)
pub const PARALLEL_EPS: f64 = 1e-12;

/// Allowed departure of an averaged custom rotation's determinant from 1 before warning
pub const DETERMINANT_TOL: f64 = 1e-3;

/// Minimum number of extra planes generated for angle integration
pub const MIN_ANGLE_PLANES: usize = 2;

/// Maximum number of extra planes generated for angle integration
pub const MAX_ANGLE_PLANES: usize = 360;

/// Wall-clock interval between two progress reports of the rebinning loop (seconds)
pub const PROGRESS_INTERVAL_SECS: u64 = 5;

/// Default output grid resolution (pixels per side)
pub const DEFAULT_RESOLUTION: usize = 150;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in degrees
pub type Degree = f64;
/// Angle in radians
pub type Radian = f64;
/// Time in float seconds
pub type Seconds = f64;
/// Energy in eV
pub type ElectronVolt = f64;
/// Speed in km/s
pub type KmPerSec = f64;
