//! Progress reporting shared by the decoder and encoder.

/// Progress callback: `(label, fraction in [0, 1])`.
pub type ProgressFn<'a> = &'a mut dyn FnMut(&str, f32);

/// Wraps an optional callback and keeps reported fractions monotonic.
pub(crate) struct Progress<'a> {
    callback: Option<ProgressFn<'a>>,
    last: f32,
}

impl<'a> Progress<'a> {
    pub fn new(callback: Option<ProgressFn<'a>>) -> Self {
        Self {
            callback,
            last: 0.0,
        }
    }

    /// Report `done / total`, clamped to `[previous, 1]`.
    pub fn report(&mut self, label: &str, done: usize, total: usize) {
        let Some(callback) = self.callback.as_mut() else {
            return;
        };
        let fraction = if total == 0 {
            0.0
        } else {
            (done as f64 / total as f64) as f32
        };
        self.last = fraction.clamp(self.last, 1.0);
        callback(label, self.last);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fractions_never_decrease() {
        let mut seen = Vec::new();
        let mut record = |label: &str, f: f32| seen.push((label.to_string(), f));
        {
            let mut progress = Progress::new(Some(&mut record));
            progress.report("a", 5, 10);
            progress.report("b", 2, 10);
            progress.report("c", 30, 10);
            progress.report("d", 0, 0);
        }
        let fractions: Vec<f32> = seen.iter().map(|(_, f)| *f).collect();
        assert_eq!(fractions, vec![0.5, 0.5, 1.0, 1.0]);
        assert_eq!(seen[1].0, "b");
    }

    #[test]
    fn test_no_callback_is_silent() {
        let mut progress = Progress::new(None);
        progress.report("x", 1, 2);
        assert_eq!(progress.last, 0.0);
    }
}
