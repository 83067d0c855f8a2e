use serde::{Deserialize, Serialize};

/// Shape, regularization and initialization of a factorization machine
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Params {
    /// Number of attributes (features) over all tables
    pub num_attribute: usize,
    /// Dimension of the factorization (k)
    pub num_factor: usize,
    /// Whether the bias `w0` is used
    pub use_bias: bool,
    /// Whether the linear weights `w` are used
    pub use_linear: bool,
    /// Regularization of the bias
    pub reg0: f64,
    /// Regularization of the linear weights
    pub regw: f64,
    /// Regularization of the factors
    pub regv: f64,
    /// Mean of the Gaussian used to initialize the factors
    pub init_mean: f64,
    /// Standard deviation of the Gaussian used to initialize the factors
    pub init_stdev: f64,
}

impl Params {
    const DEFAULT_NUM_FACTOR: usize = 8;
    const DEFAULT_INIT_STDEV: f64 = 0.1;

    /// Creates a new [`Params`] struct for `num_attribute` attributes with default values.
    pub fn new(num_attribute: usize) -> Self {
        Params {
            num_attribute,
            num_factor: Self::DEFAULT_NUM_FACTOR,
            use_bias: true,
            use_linear: true,
            reg0: 0.0,
            regw: 0.0,
            regv: 0.0,
            init_mean: 0.0,
            init_stdev: Self::DEFAULT_INIT_STDEV,
        }
    }

    /// Sets the dimension of the factorization.
    pub fn with_num_factor(mut self, num_factor: usize) -> Self {
        self.num_factor = num_factor;
        self
    }

    /// Enables or disables the bias.
    pub fn with_bias(mut self, use_bias: bool) -> Self {
        self.use_bias = use_bias;
        self
    }

    /// Enables or disables the linear weights.
    pub fn with_linear(mut self, use_linear: bool) -> Self {
        self.use_linear = use_linear;
        self
    }

    /// Sets the regularization of bias, linear weights and factors.
    pub fn with_regularization(mut self, reg0: f64, regw: f64, regv: f64) -> Self {
        self.reg0 = reg0;
        self.regw = regw;
        self.regv = regv;
        self
    }

    /// Sets the mean and standard deviation of the factor initialization.
    pub fn with_init(mut self, init_mean: f64, init_stdev: f64) -> Self {
        self.init_mean = init_mean;
        self.init_stdev = init_stdev;
        self
    }
}
