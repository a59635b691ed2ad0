// Zimmermann generative core
//
// Derives the two abstract temporal structures the rest of the piece is
// built on: looping sequences of bar durations and pulse-duration transition
// curves. Pitch material, notation, timeline placement and rendering all
// live outside this crate and consume its output.
//
// Architecture:
// - euclid.rs: Bjorklund distribution of marked slots (rising vs falling steps)
// - nested_loop.rs: recursive cyclic loop structures with per-group closure
// - bar_solver.rs: window unfolding + exhaustive enumeration of bar-duration
//   loops under modulus/range constraints
// - similarity.rs: removal of loops that only repeat a shorter loop
// - bars.rs: bar descriptors (time signature, subdivisions, accent grid)
//   and selection of one solution
// - aco.rs: archive-based ant colony search over bounded integer vectors
// - pulse.rs: pulse transition optimizer built on aco.rs
// - config.rs: JSON-loadable parameter sets
// - error.rs: error taxonomy
//
// Everything is synchronous and deterministic. The only randomness is the
// seeded `SearchRng` inside the pulse search.

pub mod aco;
pub mod bar_solver;
pub mod bars;
pub mod config;
pub mod error;
pub mod euclid;
pub mod nested_loop;
pub mod pulse;
pub mod similarity;

pub use bars::{Bar, Fraction, bar_loop, materialize, materialize_nth, select};
pub use config::{BarLoopParams, PulseSearchConfig};
pub use error::{GenError, Result};
pub use nested_loop::{LoopNode, LoopSpec, NestedLoop};
pub use pulse::{Direction, EndStatus, PulseTrajectory, optimize};
