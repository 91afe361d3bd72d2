use crate::buffer::Buffer;
use crate::handles::MixGroupHandle;

/// A transient, per-callback carrier for one voice's or group's contribution:
/// one [`Buffer`] per channel plus the mix group it is destined for.
///
/// Drawn from a fixed pool sized for the maximum concurrent voices plus
/// layered music voices; never allocated inside the callback.
#[derive(Debug, Clone)]
pub struct MixItem {
    channels: Vec<Buffer>,
    pub destination: MixGroupHandle,
}

impl MixItem {
    pub fn new(num_channels: usize, block_size: usize) -> Self {
        MixItem {
            channels: (0..num_channels).map(|_| Buffer::new(block_size)).collect(),
            destination: MixGroupHandle::INVALID,
        }
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    pub fn channel(&self, index: usize) -> &Buffer {
        &self.channels[index]
    }

    pub fn channel_mut(&mut self, index: usize) -> &mut Buffer {
        &mut self.channels[index]
    }

    pub fn zero(&mut self) {
        for c in &mut self.channels {
            c.zero();
        }
        self.destination = MixGroupHandle::INVALID;
    }

    pub fn set(&mut self, value: f32) {
        for c in &mut self.channels {
            c.fill(value);
        }
    }

    pub fn sum(&mut self, other: &MixItem, amplitude: f32) {
        assert_eq!(self.channels.len(), other.channels.len());
        for (a, b) in self.channels.iter_mut().zip(&other.channels) {
            a.sum(b, amplitude);
        }
    }

    pub fn multiply(&mut self, other: &MixItem) {
        assert_eq!(self.channels.len(), other.channels.len());
        for (a, b) in self.channels.iter_mut().zip(&other.channels) {
            a.multiply(b);
        }
    }

    pub fn scalar_multiply(&mut self, k: f32) {
        for c in &mut self.channels {
            c.scalar_multiply(k);
        }
    }

    pub fn absolute_max(&self) -> f32 {
        self.channels.iter().fold(0.0_f32, |m, c| m.max(c.absolute_max()))
    }

    /// Writes frame-major interleaved samples into `dst`, which must be
    /// exactly `block_size * num_channels` long.
    pub fn to_interleaved(&self, dst: &mut [f32]) {
        let block_size = self.channels.first().map_or(0, Buffer::len);
        assert_eq!(dst.len(), block_size * self.channels.len());
        for frame in 0..block_size {
            for (ch_index, ch) in self.channels.iter().enumerate() {
                dst[frame * self.channels.len() + ch_index] = ch.as_slice()[frame];
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interleaves_channel_major_to_frame_major() {
        let mut item = MixItem::new(2, 2);
        item.channel_mut(0).as_mut_slice().copy_from_slice(&[1.0, 2.0]);
        item.channel_mut(1).as_mut_slice().copy_from_slice(&[3.0, 4.0]);
        let mut out = [0.0; 4];
        item.to_interleaved(&mut out);
        assert_eq!(out, [1.0, 3.0, 2.0, 4.0]);
    }

    #[test]
    fn sum_respects_amplitude() {
        let mut a = MixItem::new(1, 2);
        a.set(1.0);
        let mut b = MixItem::new(1, 2);
        b.set(2.0);
        a.sum(&b, 0.5);
        assert_eq!(a.channel(0).as_slice(), &[2.0, 2.0]);
    }
}
