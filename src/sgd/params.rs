/// Parameters of stochastic gradient descent
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Params {
    /// Number of passes over the training data
    pub num_iter: usize,
    /// Step size of every update
    pub learn_rate: f64,
}

impl Params {
    const DEFAULT_NUM_ITER: usize = 100;
    const DEFAULT_LEARN_RATE: f64 = 0.01;

    /// Creates a new [`Params`] struct with default parameter values.
    pub fn new() -> Self {
        Params {
            num_iter: Self::DEFAULT_NUM_ITER,
            learn_rate: Self::DEFAULT_LEARN_RATE,
        }
    }

    /// Sets the number of epochs.
    pub fn with_num_iter(mut self, num_iter: usize) -> Self {
        self.num_iter = num_iter;
        self
    }

    /// Sets the learning rate.
    pub fn with_learn_rate(mut self, learn_rate: f64) -> Self {
        self.learn_rate = learn_rate;
        self
    }
}

impl Default for Params {
    fn default() -> Self {
        Self::new()
    }
}
