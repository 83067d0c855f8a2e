/// Parameters of the Gibbs sampler
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Params {
    /// Number of iterations
    pub num_iter: usize,
    /// Draw from the conditional posteriors (`false` takes their means, i.e. ALS)
    pub do_sample: bool,
    /// Draw the noise precision and the priors of `w` and `v` as well
    pub do_multilevel: bool,
    /// Shape prior of all precisions
    pub alpha_0: f64,
    /// Rate prior of all precisions
    pub gamma_0: f64,
    /// Number of pseudo-observations of the prior means
    pub beta_0: f64,
    /// Prior mean of the group means
    pub mu_0: f64,
    /// Prior mean of the bias
    pub w0_mean_0: f64,
    /// Iterations skipped by the burn-in running mean
    pub burn_in: usize,
    /// Seed of the random number generator
    pub seed: u64,
}

impl Params {
    const DEFAULT_NUM_ITER: usize = 100;
    const DEFAULT_BURN_IN: usize = 5;

    /// Creates a new [`Params`] struct for Markov chain Monte Carlo with default parameter values.
    pub fn new() -> Self {
        Params {
            num_iter: Self::DEFAULT_NUM_ITER,
            do_sample: true,
            do_multilevel: true,
            alpha_0: 1.0,
            gamma_0: 1.0,
            beta_0: 1.0,
            mu_0: 0.0,
            w0_mean_0: 0.0,
            burn_in: Self::DEFAULT_BURN_IN,
            seed: 0,
        }
    }

    /// Creates a new [`Params`] struct for alternating least squares: every draw takes the mean
    /// of its conditional and the priors stay fixed at the model's regularization.
    pub fn als() -> Self {
        Self::new().with_sampling(false).with_multilevel(false)
    }

    /// Sets the number of iterations.
    pub fn with_num_iter(mut self, num_iter: usize) -> Self {
        self.num_iter = num_iter;
        self
    }

    /// Enables or disables sampling.
    pub fn with_sampling(mut self, do_sample: bool) -> Self {
        self.do_sample = do_sample;
        self
    }

    /// Enables or disables the hyperprior draws.
    pub fn with_multilevel(mut self, do_multilevel: bool) -> Self {
        self.do_multilevel = do_multilevel;
        self
    }

    /// Sets the hyperpriors `alpha_0`, `gamma_0`, `beta_0` and `mu_0`.
    pub fn with_priors(mut self, alpha_0: f64, gamma_0: f64, beta_0: f64, mu_0: f64) -> Self {
        self.alpha_0 = alpha_0;
        self.gamma_0 = gamma_0;
        self.beta_0 = beta_0;
        self.mu_0 = mu_0;
        self
    }

    /// Sets the prior mean of the bias.
    pub fn with_w0_mean(mut self, w0_mean_0: f64) -> Self {
        self.w0_mean_0 = w0_mean_0;
        self
    }

    /// Sets the length of the burn-in.
    pub fn with_burn_in(mut self, burn_in: usize) -> Self {
        self.burn_in = burn_in;
        self
    }

    /// Sets the seed of the random number generator.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

impl Default for Params {
    fn default() -> Self {
        Self::new()
    }
}
