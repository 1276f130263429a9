use std::time::{Duration, Instant};

/// Per-session counters shown in the header and logged on exit
pub struct GameMetrics {
    round_started: Instant,
    round_time: Duration,
    pub high_score: u16,
    pub games_played: u32,
    /// Remote commands that changed something
    pub commands_applied: u64,
    /// Remote commands dropped by the transition table
    pub commands_ignored: u64,
}

impl GameMetrics {
    pub fn new() -> Self {
        Self {
            round_started: Instant::now(),
            round_time: Duration::ZERO,
            high_score: 0,
            games_played: 0,
            commands_applied: 0,
            commands_ignored: 0,
        }
    }

    /// Length of the current round as of the last sample
    pub fn round_time(&self) -> Duration {
        self.round_time
    }

    /// Advance the round clock; only called while a round is live
    pub fn sample_clock(&mut self) {
        self.round_time = self.round_started.elapsed();
    }

    pub fn on_round_start(&mut self) {
        self.round_started = Instant::now();
        self.round_time = Duration::ZERO;
    }

    /// Count the round, keep the best score and freeze the clock
    pub fn on_round_over(&mut self, score: u16) {
        self.sample_clock();
        self.games_played += 1;
        self.high_score = self.high_score.max(score);
    }

    pub fn on_command(&mut self, applied: bool) {
        let counter = if applied {
            &mut self.commands_applied
        } else {
            &mut self.commands_ignored
        };
        *counter += 1;
    }

    /// Round clock as `mm:ss`; minutes keep counting past an hour
    pub fn clock_label(&self) -> String {
        let secs = self.round_time.as_secs();
        format!("{:02}:{:02}", secs / 60, secs % 60)
    }
}

impl Default for GameMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_label() {
        let mut metrics = GameMetrics::new();
        assert_eq!(metrics.clock_label(), "00:00");

        metrics.round_time = Duration::from_secs(125);
        assert_eq!(metrics.clock_label(), "02:05");

        metrics.round_time = Duration::from_secs(3661);
        assert_eq!(metrics.clock_label(), "61:01");
    }

    #[test]
    fn test_best_score_only_rises() {
        let mut metrics = GameMetrics::new();

        for (score, best) in [(10, 10), (5, 10), (15, 15)] {
            metrics.on_round_over(score);
            assert_eq!(metrics.high_score, best);
        }
        assert_eq!(metrics.games_played, 3);
    }

    #[test]
    fn test_command_counters() {
        let mut metrics = GameMetrics::new();
        metrics.on_command(true);
        metrics.on_command(false);
        metrics.on_command(false);

        assert_eq!(metrics.commands_applied, 1);
        assert_eq!(metrics.commands_ignored, 2);
    }

    #[test]
    fn test_round_start_resets_clock() {
        let mut metrics = GameMetrics::new();
        std::thread::sleep(Duration::from_millis(50));
        metrics.sample_clock();
        assert!(metrics.round_time() >= Duration::from_millis(50));

        metrics.on_round_start();
        assert_eq!(metrics.round_time(), Duration::ZERO);
        metrics.sample_clock();
        assert!(metrics.round_time() < Duration::from_millis(50));
    }

    #[test]
    fn test_round_over_freezes_clock() {
        let mut metrics = GameMetrics::new();
        std::thread::sleep(Duration::from_millis(20));
        metrics.on_round_over(3);

        let frozen = metrics.round_time();
        assert!(frozen >= Duration::from_millis(20));
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(metrics.round_time(), frozen);
    }
}
