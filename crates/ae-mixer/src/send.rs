use ae_core::MixGroupHandle;

/// A parallel routing of one mix group's accumulator into another, at a
/// fixed amplitude, independent of the group's own output link.
#[derive(Debug, Clone, Copy)]
pub struct Send {
    pub target: MixGroupHandle,
    pub amplitude: f32,
}
