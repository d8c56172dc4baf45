//! Sky geometry for star catalogs stored as Cartesian bounding boxes.
//!
//! Directions on the celestial sphere are embedded as unit vectors, so a cone
//! query becomes an axis-aligned box query with no RA wraparound and no polar
//! singularity. This crate holds the pure geometry; the store, index
//! providers and query engine live in `skybox-catalog`.
//!
//! # Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`angle`] | [`Angle`] with explicit units, wrapping, sexagesimal parsing |
//! | [`vector`] | [`Vector3`] arithmetic, normalization, Chebyshev distance |
//! | [`transform`] | [`to_cartesian`], [`to_spherical`], [`angular_separation`], [`SkyDirection`] |
//! | [`bounds`] | [`Range`] and four-axis [`Bounds`] (x, y, z, magnitude) |
//! | [`search_box`] | Angular radius → [`SearchBox`] with [`HalfWidth`] policy |
//! | [`sampler`] | [`SphereSampler`]: positions uniform per solid angle, optional [`DecCap`] |
//! | [`error`] | [`Error`] and [`Result`] shared by the whole workspace |
//!
//! # Quick Start
//!
//! ```
//! use skybox_core::{search_box, to_cartesian, Angle, Bounds};
//!
//! let star = to_cartesian(Angle::from_degrees(83.633), Angle::from_degrees(-5.375));
//! let entry = Bounds::point(&star, 9.2);
//!
//! let sb = search_box::build(&star, Angle::from_arcminutes(5.0), 14.0).unwrap();
//! assert!(sb.bounds().intersects(&entry));
//! ```
//!
//! # Features
//!
//! - **`serde`** — `Serialize`/`Deserialize` for the value types.

pub mod angle;
pub mod bounds;
pub mod constants;
pub mod error;
pub mod sampler;
pub mod search_box;
pub mod transform;
pub mod vector;

pub use angle::Angle;
pub use bounds::{Bounds, Range};
pub use error::{Error, Result};
pub use sampler::{DecCap, SkySample, SphereSampler};
pub use search_box::{HalfWidth, SearchBox};
pub use transform::{angular_separation, to_cartesian, to_spherical, SkyDirection};
pub use vector::Vector3;
