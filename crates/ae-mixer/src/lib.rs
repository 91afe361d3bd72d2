//! The summing mixer: a priority-ordered DAG of mix groups, each with a
//! volume fader, a user-facing fade lane, a plug-in chain, and sends into
//! other groups. Owns the topological recompute that keeps processing
//! order consistent with the routing graph.

pub mod mixgroup;
pub mod send;
pub mod summingmixer;

pub use ae_dsp::DspBlock;
pub use mixgroup::MixGroup;
pub use send::Send;
pub use summingmixer::SummingMixer;
