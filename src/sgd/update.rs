use crate::data::Entry;
use crate::model::{Interactions, Model};

/// Net per-attribute gradient of a row pair, reused across updates
#[derive(Clone, Debug)]
pub struct PairGradient {
    grad: Vec<f64>,
    visited: Vec<bool>,
}

impl PairGradient {
    /// Creates a workspace for `num_attribute` attributes.
    pub fn new(num_attribute: usize) -> Self {
        PairGradient {
            grad: vec![0.0; num_attribute],
            visited: vec![false; num_attribute],
        }
    }

    fn reset(&mut self, pos: &[Entry], neg: &[Entry]) {
        for e in pos.iter().chain(neg) {
            self.grad[e.id] = 0.0;
            self.visited[e.id] = false;
        }
    }

    /// Marks `id` as updated; returns `false` if it was already updated.
    fn visit(&mut self, id: usize) -> bool {
        !std::mem::replace(&mut self.visited[id], true)
    }
}

/// Applies one gradient step for a single row.
///
/// `mult` is the derivative of the loss with respect to the prediction and `ws` holds the
/// interaction sums of the row computed before the step.
pub fn sgd_step(model: &mut Model, rate: f64, row: &[Entry], mult: f64, ws: &Interactions) {
    let p = &model.params;
    let (reg0, regw, regv) = (p.reg0, p.regw, p.regv);
    if p.use_bias {
        model.w0 -= rate * (mult + reg0 * model.w0);
    }
    if p.use_linear {
        for e in row {
            let w = &mut model.w[e.id];
            *w -= rate * (mult * e.value + regw * *w);
        }
    }
    for (f, mut vf) in model.v.outer_iter_mut().enumerate() {
        let sum = ws.sum[f];
        for e in row {
            let v = &mut vf[e.id];
            let grad = sum * e.value - *v * e.value * e.value;
            *v -= rate * (mult * grad + regv * *v);
        }
    }
}

/// Applies one gradient step for the difference `prediction(pos) - prediction(neg)`.
///
/// Attributes occurring in both rows receive their net gradient in a single update. The bias
/// cancels out and is only regularized.
#[allow(clippy::too_many_arguments)]
pub fn pair_sgd_step(
    model: &mut Model,
    rate: f64,
    pos: &[Entry],
    neg: &[Entry],
    mult: f64,
    ws_pos: &Interactions,
    ws_neg: &Interactions,
    grad: &mut PairGradient,
) {
    let p = &model.params;
    let (reg0, regw, regv) = (p.reg0, p.regw, p.regv);
    if p.use_bias {
        model.w0 -= reg0 * model.w0;
    }
    if p.use_linear {
        grad.reset(pos, neg);
        for e in pos {
            grad.grad[e.id] += e.value;
        }
        for e in neg {
            grad.grad[e.id] -= e.value;
        }
        for e in pos.iter().chain(neg) {
            if grad.visit(e.id) {
                let w = &mut model.w[e.id];
                *w -= rate * (mult * grad.grad[e.id] + regw * *w);
            }
        }
    }
    for (f, mut vf) in model.v.outer_iter_mut().enumerate() {
        grad.reset(pos, neg);
        for e in pos {
            grad.grad[e.id] += ws_pos.sum[f] * e.value - vf[e.id] * e.value * e.value;
        }
        for e in neg {
            grad.grad[e.id] -= ws_neg.sum[f] * e.value - vf[e.id] * e.value * e.value;
        }
        for e in pos.iter().chain(neg) {
            if grad.visit(e.id) {
                let v = &mut vf[e.id];
                *v -= rate * (mult * grad.grad[e.id] + regv * *v);
            }
        }
    }
}
