/// Decoded, deinterleaved PCM: one contiguous `Vec<f32>` per channel, all of
/// equal length. Owned exclusively by the data cache; voices only ever hold
/// a cheap `Arc` clone, never a copy of the samples.
#[derive(Debug, Clone)]
pub struct AudioData {
    channels: Vec<Vec<f32>>,
    frame_count: usize,
}

impl AudioData {
    /// Deinterleaves `interleaved` (frame-major) into channel-major storage.
    pub fn from_interleaved(interleaved: &[f32], num_channels: usize) -> Self {
        assert!(num_channels > 0);
        let frame_count = interleaved.len() / num_channels;
        let mut channels = vec![Vec::with_capacity(frame_count); num_channels];
        for frame in 0..frame_count {
            for (ch, channel) in channels.iter_mut().enumerate() {
                channel.push(interleaved[frame * num_channels + ch]);
            }
        }
        AudioData { channels, frame_count }
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn channel(&self, index: usize) -> &[f32] {
        &self.channels[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deinterleaves_stereo() {
        let interleaved = [1.0, 10.0, 2.0, 20.0, 3.0, 30.0];
        let data = AudioData::from_interleaved(&interleaved, 2);
        assert_eq!(data.frame_count(), 3);
        assert_eq!(data.channel(0), &[1.0, 2.0, 3.0]);
        assert_eq!(data.channel(1), &[10.0, 20.0, 30.0]);
    }
}
