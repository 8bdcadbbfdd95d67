//! # cellcorr
//!
//! `cellcorr` is a Rust library for neighbor search and pair correlation analysis in periodic
//! simulation boxes. It bins points into a cell list, walks the cells in expanding shells to find
//! neighbors, and accumulates pair statistics across threads without locks.
//!
//! ## Features
//!
//! - **Periodic boxes**: Triclinic 2D and 3D boxes with per-axis periodicity and minimum-image distances.
//! - **Cell-list search**: Lazily evaluated ball queries and k-nearest-neighbor queries on a uniform grid.
//! - **Parallel accumulation**: Per-worker histograms filled with `rayon`, merged lazily on first read.
//! - **Observables**: Correlation functions over real or complex values, radial distribution functions,
//!   2D potentials of mean force and torque, and Debye structure factors.
//!
//! ## Example
//!
//! See `demos/rdf_lattice.rs` for the RDF of a noisy fcc crystal.
//!
//! ## Main Interface
//!
//! Points are indexed by a [`CellGrid`], which implements the [`NeighborQuery`] trait. The
//! observables ([`CorrelationFunction`], [`Rdf`], [`PmftXy2d`]) accept any [`NeighborQuery`] and
//! optionally a precomputed [`NeighborList`].

mod bounds;
mod cell_grid;
mod cell_shell;
mod correlation;
pub mod data;
mod error;
mod histogram;
mod neighbor_list;
mod pmft;
mod query;
mod rdf;
pub mod structure_factor;
mod thread_local;

pub use bounds::PeriodicBox;
pub use cell_grid::CellGrid;
pub use cell_grid::CellGridIter;
pub use cell_shell::CellShellIterator;
pub use cell_shell::shell_size;
pub use correlation::CorrelationFunction;
pub use correlation::PairValue;
pub use data::UnitCell;
pub use data::random_system;
pub use error::Error;
pub use error::Result;
pub use histogram::Histogram;
pub use histogram::RegularAxis;
pub use neighbor_list::NeighborList;
pub use neighbor_list::for_each_bond;
pub use pmft::PmftXy2d;
pub use query::BallQueryIter;
pub use query::BruteForceQuery;
pub use query::NearestQueryIter;
pub use query::NeighborBond;
pub use query::NeighborQuery;
pub use query::QueryArgs;
pub use query::QueryMode;
pub use rdf::Rdf;
pub use structure_factor::PartialCounts;
pub use structure_factor::debye_from_histogram;
pub use thread_local::ThreadLocal;
