use ae_bridge::{AudioCommand, CommandSender};
use ae_core::{CueHandle, TransitionHandle};
use ae_music::{Cue, Meter, MusicAuthoringCommand, MusicAuthoringSender, Stinger, Transition, TransitionCondition};

/// Cached snapshot of what the audio thread last reported about music
/// playback, kept current by [`crate::Engine::process_messages`]. Read-only
/// accessors on [`Music`] answer out of this rather than round-tripping to
/// the audio thread, matching the stance every other status read-out in
/// this crate takes (see [`crate::Mixer::peak`]).
#[derive(Debug, Clone, Default)]
pub struct MusicState {
    pub(crate) tempo_bpm: f32,
    pub(crate) meter: Meter,
    pub(crate) bar: i32,
    pub(crate) beat: i32,
    pub(crate) current_cue: Option<CueHandle>,
    pub(crate) transitions: Vec<Transition>,
}

/// Control-side handle onto music authoring and playback. Borrowed from
/// [`crate::Engine::music`].
pub struct Music<'a> {
    commands: &'a mut CommandSender,
    authoring: &'a mut MusicAuthoringSender,
    state: &'a mut MusicState,
}

impl<'a> Music<'a> {
    pub(crate) fn new(commands: &'a mut CommandSender, authoring: &'a mut MusicAuthoringSender, state: &'a mut MusicState) -> Self {
        Music { commands, authoring, state }
    }

    /// Authoring is append-only: there is no `destroy_cue`/`destroy_transition`/
    /// `destroy_stinger`, mirroring the fixed-capacity `MusicDatabase` these
    /// land in, which never frees a slot once filled.
    pub fn create_cue(&mut self, cue: Cue) {
        self.authoring.send(MusicAuthoringCommand::AddCue(cue));
    }

    pub fn create_transition(&mut self, transition: Transition) {
        self.state.transitions.push(transition.clone());
        self.authoring.send(MusicAuthoringCommand::AddTransition(transition));
    }

    pub fn create_stinger(&mut self, stinger: Stinger) {
        self.authoring.send(MusicAuthoringCommand::AddStinger(stinger));
    }

    pub fn play(&mut self, transition: TransitionHandle, playhead_at_request: i64) {
        self.commands.send(AudioCommand::PlayTransition { transition, playhead_at_request });
    }

    /// Looks up the first transition authored so far whose condition
    /// matches `user_data` at the current bar/beat/cue, and plays it.
    /// Returns the transition played, if any.
    pub fn play_matching(&mut self, user_data: &[u8; 16], playhead_at_request: i64) -> Option<TransitionHandle> {
        let handle = self.transition_matching(user_data)?;
        self.play(handle, playhead_at_request);
        Some(handle)
    }

    pub fn transition_matching(&self, user_data: &[u8; 16]) -> Option<TransitionHandle> {
        self.state
            .transitions
            .iter()
            .find(|t| match &t.condition {
                Some(condition) => self.condition_matches(condition, user_data),
                None => false,
            })
            .map(|t| t.handle)
    }

    fn condition_matches(&self, condition: &TransitionCondition, user_data: &[u8; 16]) -> bool {
        condition.matches(user_data, self.state.current_cue, self.state.bar, self.state.beat)
    }

    pub fn stop(&mut self, stop_time: i64) {
        self.commands.send(AudioCommand::StopMusic { stop_time });
    }

    pub fn fade(&mut self, start_time: i64, amplitude: f32, duration_samples: i64, stop_on_done: bool) {
        self.commands.send(AudioCommand::FadeMusic { start_time, amplitude, duration_samples, stop_on_done });
    }

    pub fn fade_out_and_stop(&mut self, start_time: i64, duration_samples: i64) {
        self.fade(start_time, 0.0, duration_samples, true);
    }

    pub fn set_tempo(&mut self, tempo_bpm: f32, meter: Meter) {
        self.commands.send(AudioCommand::SetTempo { tempo_bpm, meter_top: meter.top, meter_bottom: meter.bottom });
    }

    pub fn tempo(&self) -> f32 {
        self.state.tempo_bpm
    }

    pub fn meter(&self) -> Meter {
        self.state.meter
    }

    pub fn bar(&self) -> i32 {
        self.state.bar
    }

    pub fn beat(&self) -> i32 {
        self.state.beat
    }

    pub fn current_cue(&self) -> Option<CueHandle> {
        self.state.current_cue
    }
}

/// Control-side handle onto every message the audio thread emits, drained
/// into a local queue once per tick by [`crate::Engine::process_messages`]
/// and handed out here one at a time, in emission order.
pub struct Event<'a> {
    pending: &'a mut std::collections::VecDeque<ae_bridge::AudioMessage>,
}

impl<'a> Event<'a> {
    pub(crate) fn new(pending: &'a mut std::collections::VecDeque<ae_bridge::AudioMessage>) -> Self {
        Event { pending }
    }

    pub fn poll(&mut self) -> Option<ae_bridge::AudioMessage> {
        self.pending.pop_front()
    }

    pub fn drain(&mut self, mut handle: impl FnMut(ae_bridge::AudioMessage)) {
        while let Some(message) = self.pending.pop_front() {
            handle(message);
        }
    }
}
