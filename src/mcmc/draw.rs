use rand::Rng;

use super::draws::Draws;
use super::predict::compute_q;
use super::{Counter, Diagnostics, Sampler};
use crate::data::Entry;

/// Draws a parameter from its Gaussian conditional.
///
/// `mean_raw` is `Σ h (e - θ h)` and `sum_hh` is `Σ h²` over the cases containing the parameter,
/// where `h` is the derivative of the prediction with respect to the parameter. Without data and
/// prior precision the parameter is set to zero.
#[allow(clippy::too_many_arguments)]
fn draw_conditional<R: Rng>(
    draws: &mut Draws<R>,
    counter: &mut Counter,
    alpha: f64,
    old: f64,
    mean_raw: f64,
    sum_hh: f64,
    mu: f64,
    lambda: f64,
) -> f64 {
    let var = 1.0 / (lambda + alpha * sum_hh);
    if !var.is_finite() {
        return 0.0;
    }
    let mean = -var * (alpha * mean_raw - mu * lambda);
    counter.accept(old, draws.gaussian(mean, var))
}

fn column(xt: &crate::data::SparseMatrix, i: usize) -> &[Entry] {
    if i < xt.num_rows() {
        xt.row(i)
    } else {
        &[]
    }
}

impl Sampler<'_> {
    /// Draws every parameter once, keeping the residuals of the training cases up to date.
    ///
    /// The order is: noise precision, bias, priors of the linear weights, linear weights, priors
    /// of the factors and then the factors one factor at a time.
    pub fn draw(&mut self) -> Diagnostics {
        let mut diag = Diagnostics::default();
        let use_bias = self.model.params.use_bias;
        let use_linear = self.model.params.use_linear;
        let multilevel = self.params.do_multilevel;

        if multilevel {
            self.draw_alpha(&mut diag);
        }
        if use_bias {
            self.draw_w0(&mut diag);
        }
        if use_linear {
            if multilevel {
                self.draw_w_lambda(&mut diag);
                self.draw_w_mu(&mut diag);
            }
            self.draw_w(&mut diag);
            for r in 0..self.relations.len() {
                self.draw_w_relation(r, &mut diag);
            }
        }
        if self.model.num_factor() > 0 {
            if multilevel {
                self.draw_v_lambda(&mut diag);
                self.draw_v_mu(&mut diag);
            }
            for f in 0..self.model.num_factor() {
                compute_q(&*self.model, self.train, f, &mut self.train_cache);
                self.draw_v(f, &mut diag);
                for r in 0..self.relations.len() {
                    self.draw_v_relation(r, f, &mut diag);
                }
            }
        }
        diag
    }

    fn draw_alpha(&mut self, diag: &mut Diagnostics) {
        let p = &self.params;
        let sum_sqr: f64 = self.train_cache.iter().map(|t| t.e * t.e).sum();
        let shape = 0.5 * (p.alpha_0 + self.train_cache.len() as f64);
        let rate = 0.5 * (p.gamma_0 + sum_sqr);
        let alpha = self.draws.gamma(shape, rate);
        self.hyper.alpha = diag.alpha.accept(self.hyper.alpha, alpha);
    }

    fn draw_w0(&mut self, diag: &mut Diagnostics) {
        let alpha = self.hyper.alpha;
        let reg0 = self.model.params.reg0;
        let w_old = self.model.w0;
        let mean_raw: f64 = self.train_cache.iter().map(|t| t.e - w_old).sum();
        let sum_hh = self.train_cache.len() as f64;
        let w_new = draw_conditional(
            &mut self.draws,
            &mut diag.w0,
            alpha,
            w_old,
            mean_raw,
            sum_hh,
            self.params.w0_mean_0,
            reg0,
        );
        self.model.w0 = w_new;
        let delta = w_old - w_new;
        for t in self.train_cache.iter_mut() {
            t.e -= delta;
        }
    }

    fn draw_w_lambda(&mut self, diag: &mut Diagnostics) {
        let p = &self.params;
        let mut sum_sqr = vec![0.0; self.groups.num_groups()];
        for (i, &w) in self.model.w.iter().enumerate() {
            let g = self.groups.group(i);
            let d = w - self.hyper.w_mu[g];
            sum_sqr[g] += d * d;
        }
        for (g, &sum_sqr) in sum_sqr.iter().enumerate() {
            let mu = self.hyper.w_mu[g];
            let shape = 0.5 * (p.alpha_0 + self.groups.count(g) as f64 + 1.0);
            let rate = 0.5 * (p.gamma_0 + p.beta_0 * (p.mu_0 - mu) * (p.mu_0 - mu) + sum_sqr);
            let lambda = self.draws.gamma(shape, rate);
            self.hyper.w_lambda[g] = diag.w_lambda.accept(self.hyper.w_lambda[g], lambda);
        }
    }

    fn draw_w_mu(&mut self, diag: &mut Diagnostics) {
        let p = &self.params;
        let mut sum = vec![0.0; self.groups.num_groups()];
        for (i, &w) in self.model.w.iter().enumerate() {
            sum[self.groups.group(i)] += w;
        }
        for (g, &sum) in sum.iter().enumerate() {
            let n = self.groups.count(g) as f64 + p.beta_0;
            let mean = (sum + p.beta_0 * p.mu_0) / n;
            let var = 1.0 / (n * self.hyper.w_lambda[g]);
            let mu = self.draws.gaussian(mean, var);
            self.hyper.w_mu[g] = diag.w_mu.accept(self.hyper.w_mu[g], mu);
        }
    }

    fn draw_v_lambda(&mut self, diag: &mut Diagnostics) {
        let p = &self.params;
        let num_groups = self.groups.num_groups();
        for (f, vf) in self.model.v.outer_iter().enumerate() {
            let mut sum_sqr = vec![0.0; num_groups];
            for (i, &v) in vf.iter().enumerate() {
                let g = self.groups.group(i);
                let d = v - self.hyper.v_mu[[g, f]];
                sum_sqr[g] += d * d;
            }
            for (g, &sum_sqr) in sum_sqr.iter().enumerate() {
                let mu = self.hyper.v_mu[[g, f]];
                let shape = 0.5 * (p.alpha_0 + self.groups.count(g) as f64 + 1.0);
                let rate =
                    0.5 * (p.gamma_0 + p.beta_0 * (p.mu_0 - mu) * (p.mu_0 - mu) + sum_sqr);
                let lambda = self.draws.gamma(shape, rate);
                let old = self.hyper.v_lambda[[g, f]];
                self.hyper.v_lambda[[g, f]] = diag.v_lambda.accept(old, lambda);
            }
        }
    }

    fn draw_v_mu(&mut self, diag: &mut Diagnostics) {
        let p = &self.params;
        let num_groups = self.groups.num_groups();
        for (f, vf) in self.model.v.outer_iter().enumerate() {
            let mut sum = vec![0.0; num_groups];
            for (i, &v) in vf.iter().enumerate() {
                sum[self.groups.group(i)] += v;
            }
            for (g, &sum) in sum.iter().enumerate() {
                let n = self.groups.count(g) as f64 + p.beta_0;
                let mean = (sum + p.beta_0 * p.mu_0) / n;
                let var = 1.0 / (n * self.hyper.v_lambda[[g, f]]);
                let mu = self.draws.gaussian(mean, var);
                let old = self.hyper.v_mu[[g, f]];
                self.hyper.v_mu[[g, f]] = diag.v_mu.accept(old, mu);
            }
        }
    }

    /// Draws the linear weights of the attributes of the primary table.
    fn draw_w(&mut self, diag: &mut Diagnostics) {
        let alpha = self.hyper.alpha;
        let train = self.train;
        let xt = train.transposed();
        for &i in self.main_attributes.iter() {
            let g = self.groups.group(i);
            let col = column(xt, i);
            let w_old = self.model.w[i];
            let (mut mean_raw, mut sum_xx) = (0.0, 0.0);
            for x in col {
                mean_raw += x.value * (self.train_cache[x.id].e - w_old * x.value);
                sum_xx += x.value * x.value;
            }
            let w_new = draw_conditional(
                &mut self.draws,
                &mut diag.w,
                alpha,
                w_old,
                mean_raw,
                sum_xx,
                self.hyper.w_mu[g],
                self.hyper.w_lambda[g],
            );
            self.model.w[i] = w_new;
            let delta = w_old - w_new;
            for x in col {
                self.train_cache[x.id].e -= x.value * delta;
            }
        }
    }

    /// Draws the linear weights of the attributes of relation `r`.
    fn draw_w_relation(&mut self, r: usize, diag: &mut Diagnostics) {
        let alpha = self.hyper.alpha;
        let train = self.train;
        let join = &train.relations[r];
        let data = &join.data;
        let cache = &mut self.relations[r];
        cache.gather_e(join, &self.train_cache);
        for (j, col) in data.xt.rows().enumerate() {
            let i = data.attr_offset + j;
            let g = self.groups.group(i);
            let w_old = self.model.w[i];
            let (mut mean_raw, mut sum_xx) = (0.0, 0.0);
            for x in col {
                let row = &cache.rows[x.id];
                mean_raw += x.value * (row.e - row.wnum * w_old * x.value);
                sum_xx += row.wnum * x.value * x.value;
            }
            let w_new = draw_conditional(
                &mut self.draws,
                &mut diag.w,
                alpha,
                w_old,
                mean_raw,
                sum_xx,
                self.hyper.w_mu[g],
                self.hyper.w_lambda[g],
            );
            self.model.w[i] = w_new;
            let delta = w_old - w_new;
            for x in col {
                let row = &mut cache.rows[x.id];
                row.e -= row.wnum * x.value * delta;
                row.shift_e += x.value * delta;
            }
        }
        cache.scatter_e(join, &mut self.train_cache);
    }

    /// Draws factor `f` of the attributes of the primary table.
    fn draw_v(&mut self, f: usize, diag: &mut Diagnostics) {
        let alpha = self.hyper.alpha;
        let train = self.train;
        let xt = train.transposed();
        for &i in self.main_attributes.iter() {
            let g = self.groups.group(i);
            let col = column(xt, i);
            let v_old = self.model.v[[f, i]];
            let (mut sum_he, mut sum_hh) = (0.0, 0.0);
            for x in col {
                let t = &self.train_cache[x.id];
                let h = x.value * (t.q - x.value * v_old);
                sum_he += h * t.e;
                sum_hh += h * h;
            }
            let v_new = draw_conditional(
                &mut self.draws,
                &mut diag.v,
                alpha,
                v_old,
                sum_he - v_old * sum_hh,
                sum_hh,
                self.hyper.v_mu[[g, f]],
                self.hyper.v_lambda[[g, f]],
            );
            self.model.v[[f, i]] = v_new;
            let delta = v_old - v_new;
            for x in col {
                let t = &mut self.train_cache[x.id];
                let h = x.value * (t.q - x.value * v_old);
                t.e -= h * delta;
                t.q -= x.value * delta;
            }
        }
    }

    /// Draws factor `f` of the attributes of relation `r`.
    fn draw_v_relation(&mut self, r: usize, f: usize, diag: &mut Diagnostics) {
        let alpha = self.hyper.alpha;
        let train = self.train;
        let join = &train.relations[r];
        let data = &join.data;
        let cache = &mut self.relations[r];
        cache.gather_eq(join, &self.train_cache);
        for (j, col) in data.xt.rows().enumerate() {
            let i = data.attr_offset + j;
            let g = self.groups.group(i);
            let v_old = self.model.v[[f, i]];
            let (mut sum_he, mut sum_hh) = (0.0, 0.0);
            for x in col {
                let row = &cache.rows[x.id];
                let xv = x.value * v_old;
                sum_he += x.value * (row.qe - xv * row.e);
                sum_hh += x.value
                    * x.value
                    * (row.q_sqr - 2.0 * xv * row.q + xv * xv * row.wnum);
            }
            let v_new = draw_conditional(
                &mut self.draws,
                &mut diag.v,
                alpha,
                v_old,
                sum_he - v_old * sum_hh,
                sum_hh,
                self.hyper.v_mu[[g, f]],
                self.hyper.v_lambda[[g, f]],
            );
            self.model.v[[f, i]] = v_new;
            let delta = v_old - v_new;
            for x in col {
                cache.rows[x.id].shift_factor(x.value, v_old, delta);
            }
        }
        cache.scatter_eq(join, &mut self.train_cache);
    }
}
