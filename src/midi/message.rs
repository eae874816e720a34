//! System real-time and common bytes used by a clock master

/// Timing Clock, sent 24 times per quarter note
pub const TIMING_CLOCK: u8 = 0xF8;
pub const START: u8 = 0xFA;
pub const STOP: u8 = 0xFC;
pub const SONG_POSITION_POINTER: u8 = 0xF2;

/// Messages a clock master emits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockMessage {
    /// One clock pulse
    TimingClock,
    /// Start playback from the current song position
    Start,
    /// Stop playback
    Stop,
    /// Song position in MIDI beats (sixteenth notes), 14 bits
    SongPosition(u16),
}

impl ClockMessage {
    pub fn to_bytes(self) -> Vec<u8> {
        match self {
            ClockMessage::TimingClock => vec![TIMING_CLOCK],
            ClockMessage::Start => vec![START],
            ClockMessage::Stop => vec![STOP],
            ClockMessage::SongPosition(position) => {
                let lsb = (position & 0x7F) as u8;
                let msb = ((position >> 7) & 0x7F) as u8;
                vec![SONG_POSITION_POINTER, lsb, msb]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_song_position_zero_is_three_bytes() {
        assert_eq!(
            ClockMessage::SongPosition(0).to_bytes(),
            vec![0xF2, 0x00, 0x00]
        );
    }

    #[test]
    fn test_song_position_splits_fourteen_bits() {
        // 0x2A5 = 0b101_0100101 -> lsb 0x25, msb 0x05
        assert_eq!(
            ClockMessage::SongPosition(0x2A5).to_bytes(),
            vec![0xF2, 0x25, 0x05]
        );
        // Bits above 14 are dropped
        assert_eq!(
            ClockMessage::SongPosition(0xFFFF).to_bytes(),
            vec![0xF2, 0x7F, 0x7F]
        );
    }

    #[test]
    fn test_real_time_bytes() {
        assert_eq!(ClockMessage::TimingClock.to_bytes(), vec![0xF8]);
        assert_eq!(ClockMessage::Start.to_bytes(), vec![0xFA]);
        assert_eq!(ClockMessage::Stop.to_bytes(), vec![0xFC]);
    }
}
