//! Playback clock fed by the host
//!
//! Hosts report positions at their own pace. While playing, the clock
//! advances the last report by wall time so highlights keep moving between
//! reports, but never more than `max_extrapolation_ms` past it.

use std::time::Instant;

#[derive(Debug, Clone)]
pub struct PlaybackClock {
    /// Last reported position in milliseconds
    position_ms: i64,
    /// When the last position was reported
    anchored_at: Option<Instant>,
    playing: bool,
    max_extrapolation_ms: i64,
    /// Added to every position (latency compensation)
    offset_ms: i64,
}

impl PlaybackClock {
    pub fn new(max_extrapolation_ms: i64, offset_ms: i64) -> Self {
        Self {
            position_ms: 0,
            anchored_at: None,
            playing: false,
            max_extrapolation_ms: max_extrapolation_ms.max(0),
            offset_ms,
        }
    }

    /// Record a position report; out-of-order reports simply replace the anchor
    pub fn report(&mut self, position_ms: i64, now: Instant) {
        self.position_ms = position_ms;
        self.anchored_at = Some(now);
    }

    pub fn set_playing(&mut self, playing: bool, now: Instant) {
        if self.playing == playing {
            return;
        }
        // Freeze or restart extrapolation from the current position
        self.position_ms = self.position_at(now).saturating_sub(self.offset_ms);
        self.anchored_at = Some(now);
        self.playing = playing;
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn set_offset(&mut self, offset_ms: i64) {
        self.offset_ms = offset_ms;
    }

    pub fn set_max_extrapolation(&mut self, max_extrapolation_ms: i64) {
        self.max_extrapolation_ms = max_extrapolation_ms.max(0);
    }

    /// Last reported position, without extrapolation
    pub fn reported_position(&self) -> i64 {
        self.position_ms.saturating_add(self.offset_ms)
    }

    /// Position at `now`
    pub fn position_at(&self, now: Instant) -> i64 {
        let elapsed = match (self.playing, self.anchored_at) {
            (true, Some(anchor)) => {
                let ms = now.saturating_duration_since(anchor).as_millis();
                (ms.min(self.max_extrapolation_ms as u128)) as i64
            }
            _ => 0,
        };
        self.position_ms
            .saturating_add(elapsed)
            .saturating_add(self.offset_ms)
    }
}

impl Default for PlaybackClock {
    fn default() -> Self {
        Self::new(250, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_paused_clock_does_not_advance() {
        let start = Instant::now();
        let mut clock = PlaybackClock::default();
        clock.report(1000, start);
        assert_eq!(clock.position_at(start + Duration::from_millis(100)), 1000);
    }

    #[test]
    fn test_playing_clock_extrapolates_with_cap() {
        let start = Instant::now();
        let mut clock = PlaybackClock::new(250, 0);
        clock.set_playing(true, start);
        clock.report(1000, start);
        assert_eq!(clock.position_at(start + Duration::from_millis(100)), 1100);
        assert_eq!(clock.position_at(start + Duration::from_secs(5)), 1250);
    }

    #[test]
    fn test_backward_report_replaces_anchor() {
        let start = Instant::now();
        let mut clock = PlaybackClock::new(250, 0);
        clock.report(9000, start);
        clock.report(2000, start + Duration::from_millis(10));
        assert_eq!(clock.reported_position(), 2000);
    }

    #[test]
    fn test_pause_freezes_extrapolated_position() {
        let start = Instant::now();
        let mut clock = PlaybackClock::new(1000, 0);
        clock.set_playing(true, start);
        clock.report(0, start);
        let pause_at = start + Duration::from_millis(200);
        clock.set_playing(false, pause_at);
        assert_eq!(clock.position_at(pause_at + Duration::from_secs(3)), 200);
    }

    #[test]
    fn test_offset_applied() {
        let start = Instant::now();
        let mut clock = PlaybackClock::new(0, 150);
        clock.report(1000, start);
        assert_eq!(clock.position_at(start), 1150);
        assert_eq!(clock.reported_position(), 1150);
    }

    #[test]
    fn test_extreme_reports_saturate() {
        let start = Instant::now();
        let mut clock = PlaybackClock::new(250, 150);
        clock.set_playing(true, start);
        clock.report(i64::MAX, start);
        assert_eq!(clock.position_at(start + Duration::from_millis(100)), i64::MAX);

        clock.set_offset(-150);
        clock.report(i64::MIN, start);
        assert_eq!(clock.reported_position(), i64::MIN);
        clock.set_playing(false, start + Duration::from_millis(10));
        assert!(clock.position_at(start + Duration::from_secs(1)) < 0);
    }
}
