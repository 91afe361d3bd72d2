//! The stateful per-sample DSP blocks that voices and mix groups compose:
//! gain, pan, Butterworth/biquad filters, feedback delay, dynamics,
//! partitioned convolution, and distance-based positioning.

pub mod biquad;
pub mod butterworth;
pub mod convolver;
pub mod delay;
pub mod dspblock;
pub mod dynamics;
pub mod fader;
pub mod gain;
pub mod pan;
pub mod positioning;
pub mod traits;

pub use biquad::{BiquadFilter, BiquadKind};
pub use butterworth::{ButterworthFilter, FilterOrder};
pub use convolver::ConvolverDsp;
pub use delay::DelayDsp;
pub use dspblock::DspBlock;
pub use dynamics::{CompressorDsp, LimiterDsp};
pub use fader::Fader;
pub use gain::GainDsp;
pub use pan::{PanDsp, PanLaw};
pub use positioning::{AttenuationCurve, PositioningDsp, PositioningParameters};
pub use traits::Processor;
