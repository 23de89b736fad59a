//! MACD (Moving Average Convergence Divergence) indicator

use anyhow::Result;
use ta::indicators::MovingAverageConvergenceDivergence;
use ta::Next;

pub const FAST_PERIOD: usize = 12;
pub const SLOW_PERIOD: usize = 26;
pub const SIGNAL_PERIOD: usize = 9;

/// MACD line, signal line and their difference for one bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdOutput {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// MACD indicator wrapper
#[derive(Debug)]
pub struct Macd {
    inner: MovingAverageConvergenceDivergence,
    slow_period: usize,
    signal_period: usize,
    update_count: usize,
    last_output: Option<MacdOutput>,
}

impl Macd {
    /// Create new MACD indicator
    pub fn new(fast_period: usize, slow_period: usize, signal_period: usize) -> Result<Self> {
        let inner = MovingAverageConvergenceDivergence::new(fast_period, slow_period, signal_period)
            .map_err(|e| anyhow::anyhow!("invalid MACD periods: {:?}", e))?;
        Ok(Self {
            inner,
            slow_period,
            signal_period,
            update_count: 0,
            last_output: None,
        })
    }

    /// The classic 12/26/9 configuration
    pub fn standard() -> Result<Self> {
        Self::new(FAST_PERIOD, SLOW_PERIOD, SIGNAL_PERIOD)
    }

    pub fn update(&mut self, close: f64) -> Option<MacdOutput> {
        let output = self.inner.next(close);
        self.update_count += 1;
        if self.is_ready() {
            self.last_output = Some(MacdOutput {
                macd: output.macd,
                signal: output.signal,
                histogram: output.histogram,
            });
        }
        self.last_output
    }

    /// MACD needs slow_period + signal_period values
    pub fn is_ready(&self) -> bool {
        self.update_count > self.slow_period + self.signal_period
    }

    pub fn output(&self) -> Option<MacdOutput> {
        self.last_output
    }

    /// True when the histogram turned positive on the last close, i.e. the
    /// MACD line crossed above its signal line.
    pub fn bullish_crossover(closes: &[f64]) -> Result<bool> {
        let mut macd = Self::standard()?;
        let mut previous: Option<MacdOutput> = None;
        let mut current: Option<MacdOutput> = None;

        for &close in closes {
            previous = current;
            current = macd.update(close);
        }

        Ok(match (previous, current) {
            (Some(prev), Some(cur)) => prev.histogram <= 0.0 && cur.histogram > 0.0,
            _ => false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_macd_not_ready_on_short_history() {
        let mut macd = Macd::standard().unwrap();
        for i in 0..20 {
            assert!(macd.update(100.0 + i as f64).is_none());
        }
        assert!(!macd.is_ready());
    }

    #[test]
    fn test_macd_ready_after_warmup() {
        let mut macd = Macd::standard().unwrap();
        for i in 0..50 {
            macd.update(100.0 + (i as f64 * 0.1));
        }

        assert!(macd.is_ready());
        let out = macd.output().unwrap();
        assert!((out.histogram - (out.macd - out.signal)).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_periods_rejected() {
        assert!(Macd::new(0, 26, 9).is_err());
    }

    #[test]
    fn test_bullish_crossover_after_reversal() {
        // Long decline drives the histogram negative, then a sharp jump on
        // the final bar pushes the MACD line over the signal line.
        let mut closes: Vec<f64> = (0..60).map(|i| 200.0 - i as f64).collect();
        closes.push(400.0);

        assert!(Macd::bullish_crossover(&closes).unwrap());
    }

    #[test]
    fn test_no_crossover_in_steady_decline() {
        let closes: Vec<f64> = (0..60).map(|i| 200.0 - i as f64).collect();
        assert!(!Macd::bullish_crossover(&closes).unwrap());
    }

    #[test]
    fn test_no_crossover_with_too_few_closes() {
        assert!(!Macd::bullish_crossover(&[1.0, 2.0, 3.0]).unwrap());
    }
}
