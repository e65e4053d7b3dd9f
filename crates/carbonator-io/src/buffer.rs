//! Planar multichannel sample storage.

/// Audio stored one `Vec<f32>` per channel.
///
/// ```rust
/// use carbonator_io::PlanarBuffer;
///
/// let buffer = PlanarBuffer::from_interleaved(&[1.0, 2.0, 3.0, 4.0], 2);
/// assert_eq!(buffer.channel(0), Some(&[1.0, 3.0][..]));
/// assert_eq!(buffer.to_interleaved(), vec![1.0, 2.0, 3.0, 4.0]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanarBuffer {
    channels: Vec<Vec<f32>>,
}

impl PlanarBuffer {
    /// Silent buffer of `num_channels` × `num_frames`.
    pub fn new(num_channels: usize, num_frames: usize) -> Self {
        Self {
            channels: vec![vec![0.0; num_frames]; num_channels],
        }
    }

    /// Wrap existing channel vectors.
    pub fn from_channels(channels: Vec<Vec<f32>>) -> Self {
        Self { channels }
    }

    /// Split interleaved samples into channels. A trailing partial frame is
    /// dropped.
    pub fn from_interleaved(samples: &[f32], num_channels: usize) -> Self {
        if num_channels == 0 {
            return Self::default();
        }
        let num_frames = samples.len() / num_channels;
        let mut buffer = Self::new(num_channels, num_frames);
        for (frame, chunk) in samples.chunks_exact(num_channels).enumerate() {
            for (channel, &sample) in buffer.channels.iter_mut().zip(chunk) {
                channel[frame] = sample;
            }
        }
        buffer
    }

    /// Interleave all channels, frame by frame.
    pub fn to_interleaved(&self) -> Vec<f32> {
        let frames = self.num_frames();
        let mut out = Vec::with_capacity(frames * self.channels.len());
        for frame in 0..frames {
            out.extend(self.channels.iter().map(|channel| channel[frame]));
        }
        out
    }

    /// Number of channels.
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Frames in the shortest channel.
    pub fn num_frames(&self) -> usize {
        self.channels.iter().map(Vec::len).min().unwrap_or(0)
    }

    /// Whether every channel has the same length.
    pub fn is_uniform(&self) -> bool {
        self.channels
            .windows(2)
            .all(|pair| pair[0].len() == pair[1].len())
    }

    /// One channel's samples.
    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    /// All channels, mutably.
    pub fn channels_mut(&mut self) -> &mut [Vec<f32>] {
        &mut self.channels
    }

    /// Borrow frames `start..end` of every channel as a planar block.
    ///
    /// The range is clipped to the buffer length.
    pub fn block_mut(&mut self, start: usize, end: usize) -> Vec<&mut [f32]> {
        let end = end.min(self.num_frames());
        let start = start.min(end);
        self.channels
            .iter_mut()
            .map(|channel| &mut channel[start..end])
            .collect()
    }

    /// Absolute peak over all channels.
    pub fn peak(&self) -> f32 {
        self.channels
            .iter()
            .flatten()
            .fold(0.0f32, |peak, s| peak.max(s.abs()))
    }

    /// RMS over all channels.
    pub fn rms(&self) -> f32 {
        let count: usize = self.channels.iter().map(Vec::len).sum();
        if count == 0 {
            return 0.0;
        }
        let sum: f32 = self.channels.iter().flatten().map(|s| s * s).sum();
        (sum / count as f32).sqrt()
    }

    /// Append `frames` zeros to every channel.
    pub fn pad_back(&mut self, frames: usize) {
        for channel in &mut self.channels {
            channel.resize(channel.len() + frames, 0.0);
        }
    }

    /// Drop the first `frames` samples of every channel.
    pub fn trim_front(&mut self, frames: usize) {
        for channel in &mut self.channels {
            let frames = frames.min(channel.len());
            channel.drain(..frames);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interleave_roundtrip() {
        let interleaved = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let buffer = PlanarBuffer::from_interleaved(&interleaved, 3);
        assert_eq!(buffer.num_channels(), 3);
        assert_eq!(buffer.num_frames(), 2);
        assert_eq!(buffer.channel(2), Some(&[3.0, 6.0][..]));
        assert_eq!(buffer.to_interleaved(), interleaved.to_vec());
    }

    #[test]
    fn test_partial_frame_dropped() {
        let buffer = PlanarBuffer::from_interleaved(&[1.0, 2.0, 3.0], 2);
        assert_eq!(buffer.num_frames(), 1);
        assert!(PlanarBuffer::from_interleaved(&[1.0], 0).num_channels() == 0);
    }

    #[test]
    fn test_block_mut_clips_range() {
        let mut buffer = PlanarBuffer::new(2, 10);
        let block = buffer.block_mut(8, 64);
        assert_eq!(block.len(), 2);
        assert_eq!(block[0].len(), 2);
        assert!(buffer.block_mut(20, 30)[1].is_empty());
    }

    #[test]
    fn test_levels() {
        let buffer = PlanarBuffer::from_channels(vec![vec![0.5, -0.5], vec![1.0, -1.0]]);
        assert_eq!(buffer.peak(), 1.0);
        let expected = ((0.25 + 0.25 + 1.0 + 1.0) / 4.0f32).sqrt();
        assert!((buffer.rms() - expected).abs() < 1e-6);
        assert_eq!(PlanarBuffer::default().rms(), 0.0);
    }

    #[test]
    fn test_pad_and_trim() {
        let mut buffer = PlanarBuffer::from_channels(vec![vec![1.0, 2.0]]);
        buffer.pad_back(2);
        assert_eq!(buffer.channel(0), Some(&[1.0, 2.0, 0.0, 0.0][..]));
        buffer.trim_front(3);
        assert_eq!(buffer.channel(0), Some(&[0.0][..]));
        buffer.trim_front(5);
        assert_eq!(buffer.num_frames(), 0);
    }

    #[test]
    fn test_uniformity() {
        assert!(PlanarBuffer::new(3, 4).is_uniform());
        assert!(!PlanarBuffer::from_channels(vec![vec![0.0; 3], vec![0.0; 2]]).is_uniform());
    }
}
