use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// K-fold splitter over record indices.
///
/// Every index lands in exactly one test fold. Fold sizes differ by at most
/// one; the first `n % n_splits` folds take the extra index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KFold {
    n_splits: usize,
    shuffle: bool,
    random_state: Option<u64>,
}

impl KFold {
    pub fn new(n_splits: usize) -> Self {
        Self {
            n_splits,
            shuffle: false,
            random_state: None,
        }
    }

    #[must_use]
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Fix the shuffle seed. Implies shuffling.
    #[must_use]
    pub fn with_random_state(mut self, random_state: u64) -> Self {
        self.random_state = Some(random_state);
        self.shuffle = true;
        self
    }

    pub fn n_splits(&self) -> usize {
        self.n_splits
    }

    pub fn shuffle(&self) -> bool {
        self.shuffle
    }

    pub fn random_state(&self) -> Option<u64> {
        self.random_state
    }

    /// `(train, test)` index pairs, one per fold.
    ///
    /// Callers check `2 <= n_splits <= n_samples` first; with fewer samples
    /// than folds some test folds are empty.
    pub fn split(&self, n_samples: usize) -> Vec<(Vec<usize>, Vec<usize>)> {
        let mut indices = (0..n_samples).collect::<Vec<_>>();
        if self.shuffle {
            match self.random_state {
                Some(seed) => indices.shuffle(&mut StdRng::seed_from_u64(seed)),
                None => indices.shuffle(&mut rand::thread_rng()),
            }
        }

        let n_splits = self.n_splits.max(1);
        let fold_size = n_samples / n_splits;
        let remainder = n_samples % n_splits;

        let mut folds = Vec::with_capacity(n_splits);
        let mut start = 0;
        for fold in 0..n_splits {
            let end = start + fold_size + usize::from(fold < remainder);
            let test = indices[start..end].to_vec();
            let mut train = Vec::with_capacity(n_samples - test.len());
            train.extend_from_slice(&indices[..start]);
            train.extend_from_slice(&indices[end..]);
            folds.push((train, test));
            start = end;
        }
        folds
    }
}
