pub mod runner;
pub mod sampler;

pub use runner::{run_sampling_loop, run_sweep_loop};
pub use sampler::{Sampler, TickReport};
