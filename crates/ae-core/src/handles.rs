use std::sync::atomic::{AtomicU32, Ordering};

/// Zero is reserved to mean "no entity" across every handle kind.
pub const INVALID_ID: u32 = 0;

macro_rules! handle {
    ($name:ident, $counter:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
        pub struct $name(pub u32);

        static $counter: AtomicU32 = AtomicU32::new(1);

        impl $name {
            pub const INVALID: $name = $name(INVALID_ID);

            pub fn is_valid(self) -> bool {
                self.0 != INVALID_ID
            }

            /// Allocates the next handle of this kind. Control-thread only.
            pub fn next() -> Self {
                $name($counter.fetch_add(1, Ordering::Relaxed))
            }
        }
    };
}

handle!(AudioHandle, NEXT_AUDIO_HANDLE);
handle!(SoundEffectHandle, NEXT_SOUND_EFFECT_HANDLE);
handle!(MixGroupHandle, NEXT_MIX_GROUP_HANDLE);
handle!(CueHandle, NEXT_CUE_HANDLE);
handle!(TransitionHandle, NEXT_TRANSITION_HANDLE);
handle!(StingerHandle, NEXT_STINGER_HANDLE);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_are_monotonic_and_distinct() {
        let a = AudioHandle::next();
        let b = AudioHandle::next();
        assert!(a.is_valid() && b.is_valid());
        assert_ne!(a, b);
        assert!(b.0 > a.0);
    }

    #[test]
    fn default_is_invalid() {
        assert_eq!(MixGroupHandle::default(), MixGroupHandle::INVALID);
        assert!(!MixGroupHandle::default().is_valid());
    }
}
