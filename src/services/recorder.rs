//! Append-only progress series for one session
//!
//! One sample is appended per finalized rep. The series handed to the report
//! is ordered and non-decreasing in both time and correct count.

use crate::domain::types::TimeSeriesSample;

/// What happened to an appended sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Append {
    Appended,
    /// Identical to the last stored sample; nothing stored
    Duplicate,
    /// Would go backwards in time or count; rejected
    OutOfOrder,
}

#[derive(Debug, Default)]
pub struct SessionRecorder {
    samples: Vec<TimeSeriesSample>,
}

impl SessionRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, sample: TimeSeriesSample) -> Append {
        if let Some(last) = self.samples.last() {
            if *last == sample {
                return Append::Duplicate;
            }
            if sample.elapsed_secs < last.elapsed_secs
                || sample.correct_count < last.correct_count
            {
                return Append::OutOfOrder;
            }
        }
        self.samples.push(sample);
        Append::Appended
    }

    pub fn samples(&self) -> &[TimeSeriesSample] {
        &self.samples
    }

    pub fn last(&self) -> Option<&TimeSeriesSample> {
        self.samples.last()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Hand the series over at session end
    pub fn into_samples(self) -> Vec<TimeSeriesSample> {
        self.samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(secs: u64, correct: u32) -> TimeSeriesSample {
        TimeSeriesSample::new(secs, correct)
    }

    #[test]
    fn test_duplicate_sample_is_a_no_op() {
        let mut recorder = SessionRecorder::new();
        assert_eq!(recorder.append(s(3, 1)), Append::Appended);
        assert_eq!(recorder.append(s(7, 2)), Append::Appended);
        assert_eq!(recorder.append(s(7, 2)), Append::Duplicate);

        assert_eq!(recorder.samples(), &[s(3, 1), s(7, 2)]);
        assert_eq!(recorder.last(), Some(&s(7, 2)));
    }

    #[test]
    fn test_same_second_new_count_is_kept() {
        let mut recorder = SessionRecorder::new();
        recorder.append(s(7, 2));
        // Incorrect rep in the same second: count unchanged, time unchanged
        assert_eq!(recorder.append(s(7, 3)), Append::Appended);
        assert_eq!(recorder.append(s(8, 3)), Append::Appended);
        assert_eq!(recorder.len(), 3);
    }

    #[test]
    fn test_backwards_sample_rejected() {
        let mut recorder = SessionRecorder::new();
        recorder.append(s(10, 4));
        assert_eq!(recorder.append(s(9, 5)), Append::OutOfOrder);
        assert_eq!(recorder.append(s(11, 3)), Append::OutOfOrder);
        assert_eq!(recorder.into_samples(), vec![s(10, 4)]);
    }

    #[test]
    fn test_empty() {
        let recorder = SessionRecorder::new();
        assert!(recorder.is_empty());
        assert!(recorder.last().is_none());
    }
}
