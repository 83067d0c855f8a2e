use crate::relation::RelationJoin;

/// Residual `e` (prediction minus target) and partial interaction sum `q` of one case
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct ETerm {
    pub e: f64,
    pub q: f64,
}

/// Sums over all cases referencing one relation row
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct RelationRow {
    /// number of referencing cases
    pub wnum: f64,
    pub e: f64,
    pub q: f64,
    pub q_sqr: f64,
    pub qe: f64,
    /// total change of `q` not yet applied to the cases
    pub shift_q: f64,
    /// change of `e` not yet applied to the cases (beyond `-q * shift_q`)
    pub shift_e: f64,
}

/// Aggregates of the cases of a dataset per row of one relation table
#[derive(Clone, Debug)]
pub(crate) struct RelationCache {
    pub rows: Vec<RelationRow>,
}

impl RelationCache {
    pub fn new(join: &RelationJoin) -> Self {
        let rows = join
            .counts()
            .into_iter()
            .map(|n| RelationRow {
                wnum: n as f64,
                ..RelationRow::default()
            })
            .collect();
        RelationCache { rows }
    }

    /// Sums the residuals of the cases and clears the pending shifts.
    pub fn gather_e(&mut self, join: &RelationJoin, cache: &[ETerm]) {
        for row in self.rows.iter_mut() {
            row.e = 0.0;
            row.shift_e = 0.0;
        }
        for (c, term) in cache.iter().enumerate() {
            self.rows[join.relation_row(c)].e += term.e;
        }
    }

    /// Applies the pending shifts of linear weights to the residuals of the cases.
    pub fn scatter_e(&self, join: &RelationJoin, cache: &mut [ETerm]) {
        for (c, term) in cache.iter_mut().enumerate() {
            term.e -= self.rows[join.relation_row(c)].shift_e;
        }
    }

    /// Sums residuals and partial sums of the cases and clears the pending shifts.
    pub fn gather_eq(&mut self, join: &RelationJoin, cache: &[ETerm]) {
        for row in self.rows.iter_mut() {
            *row = RelationRow {
                wnum: row.wnum,
                ..RelationRow::default()
            };
        }
        for (c, term) in cache.iter().enumerate() {
            let row = &mut self.rows[join.relation_row(c)];
            row.e += term.e;
            row.q += term.q;
            row.q_sqr += term.q * term.q;
            row.qe += term.q * term.e;
        }
    }

    /// Applies the pending shifts of factors to residuals and partial sums of the cases.
    pub fn scatter_eq(&self, join: &RelationJoin, cache: &mut [ETerm]) {
        for (c, term) in cache.iter_mut().enumerate() {
            let row = &self.rows[join.relation_row(c)];
            term.e += row.shift_e - term.q * row.shift_q;
            term.q -= row.shift_q;
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

impl RelationRow {
    /// Records the change `v_old -> v_old - delta` of a factor with value `x` in this row.
    pub fn shift_factor(&mut self, x: f64, v_old: f64, delta: f64) {
        let a = x * delta;
        let (e, q, q_sqr, qe, n) = (self.e, self.q, self.q_sqr, self.qe, self.wnum);
        let xv = x * v_old;
        self.e = e - a * (q - xv * n);
        self.q = q - a * n;
        self.q_sqr = q_sqr - 2.0 * a * q + a * a * n;
        self.qe = qe - a * q_sqr + a * xv * q - a * e + a * a * q - a * a * xv * n;
        self.shift_e += a * (self.shift_q + xv);
        self.shift_q += a;
    }
}
