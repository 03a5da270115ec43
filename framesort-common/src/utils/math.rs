/// Running mean and population variance, Welford's online algorithm.
///
/// An empty accumulator has a mean and variance of zero.
#[derive(Clone, Copy, Debug, Default)]
pub struct Variance {
    count: usize,
    mean: f64,
    // sum of squared distances from the mean
    m2: f64,
}

impl Variance {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, value: impl Into<f64>) {
        let value = value.into();
        self.count += 1;
        let before = value - self.mean;
        self.mean += before / self.count as f64;
        self.m2 += before * (value - self.mean);
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Divides by `n`, not `n - 1`.
    pub fn variance(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        (self.m2 / self.count as f64).max(0.0)
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }
}

impl<A: Into<f64>> Extend<A> for Variance {
    fn extend<T: IntoIterator<Item = A>>(&mut self, iter: T) {
        iter.into_iter().for_each(|a| self.add(a))
    }
}

impl<A: Into<f64>> FromIterator<A> for Variance {
    fn from_iter<T: IntoIterator<Item = A>>(iter: T) -> Self {
        let mut var = Variance::new();
        var.extend(iter);
        var
    }
}
