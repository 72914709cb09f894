//! `GridState`: the conservative-variable field and grid geometry (`spec.md` §4.1).

use crate::error::SolverError;

/// Ratio of specific heats, air.
pub const GAMMA: f32 = 1.4;
/// Specific gas constant for air, J/(kg·K).
pub const R_SPECIFIC: f32 = 287.05;

/// Nominal physical domain length, meters.
pub const DOMAIN_LENGTH: f32 = 0.9;

/// Post-commit density floor (`spec.md` §3 invariants).
pub const RHO_MIN: f32 = 0.05;
/// Post-commit pressure floor (`spec.md` §3 invariants).
pub const P_MIN: f32 = 100.0;

/// A cell's conservative state `(ρ, ρu, ρv, ρE)`.
pub type Conserved = [f32; 4];

/// Recover pressure from a conservative 4-tuple.
///
/// Uses the intra-step floor of `10.0`, which is deliberately more lenient
/// than the post-commit invariant floor [`P_MIN`] — see `spec.md` §9.
pub fn pressure_from_conservative(rho: f32, rho_u: f32, rho_v: f32, rho_e: f32) -> f32 {
    let rho_safe = rho.max(1e-4);
    let kinetic = 0.5 * (rho_u * rho_u + rho_v * rho_v) / rho_safe;
    ((GAMMA - 1.0) * (rho_e - kinetic)).max(10.0)
}

/// Total energy per unit volume from primitive variables.
pub fn energy_from_primitive(rho: f32, u: f32, v: f32, p: f32) -> f32 {
    p / (GAMMA - 1.0) + 0.5 * rho * (u * u + v * v)
}

/// Owns the double-buffered conservative field and the simulation clock.
///
/// `Q` (committed) and `Q'` (tentative) are allocated once, here, and never
/// reallocated for the lifetime of the grid — see `spec.md` §9, "buffer
/// ownership and rollback".
pub struct GridState {
    nx: usize,
    ny: usize,
    dx: f32,
    q: Vec<f32>,
    q_next: Vec<f32>,
    /// Scratch copy of `Q'`, used by the Y-sweep so its face reads are taken
    /// from a frozen snapshot rather than the buffer it is accumulating
    /// into. Allocated once, alongside `q`/`q_next` (`spec.md` §9).
    q_scratch: Vec<f32>,
    t: f64,
}

impl GridState {
    pub fn new(nx: usize, ny: usize) -> Result<Self, SolverError> {
        if nx < 4 || ny < 4 {
            return Err(SolverError::InvalidGrid { nx, ny });
        }
        let n = nx * ny * 4;
        Ok(GridState {
            nx,
            ny,
            dx: DOMAIN_LENGTH / nx as f32,
            q: vec![0.0; n],
            q_next: vec![0.0; n],
            q_scratch: vec![0.0; n],
            t: 0.0,
        })
    }

    #[inline]
    pub fn nx(&self) -> usize {
        self.nx
    }

    #[inline]
    pub fn ny(&self) -> usize {
        self.ny
    }

    #[inline]
    pub fn dx(&self) -> f32 {
        self.dx
    }

    #[inline]
    pub fn dy(&self) -> f32 {
        self.dx
    }

    #[inline]
    pub fn t(&self) -> f64 {
        self.t
    }

    pub(crate) fn advance_time(&mut self, dt: f64) {
        self.t += dt;
    }

    #[inline]
    fn offset(&self, i: usize, j: usize) -> usize {
        (j * self.nx + i) * 4
    }

    /// Read a committed cell from `Q`.
    #[inline]
    pub fn cell(&self, i: usize, j: usize) -> Conserved {
        let o = self.offset(i, j);
        [self.q[o], self.q[o + 1], self.q[o + 2], self.q[o + 3]]
    }

    /// Read a tentative cell from `Q'`.
    #[inline]
    pub fn cell_next(&self, i: usize, j: usize) -> Conserved {
        let o = self.offset(i, j);
        [
            self.q_next[o],
            self.q_next[o + 1],
            self.q_next[o + 2],
            self.q_next[o + 3],
        ]
    }

    #[inline]
    pub fn set_cell_next(&mut self, i: usize, j: usize, value: Conserved) {
        let o = self.offset(i, j);
        self.q_next[o..o + 4].copy_from_slice(&value);
    }

    /// Add `delta` to the tentative cell in place (used to apply flux
    /// contributions from both sides of a face, `spec.md` §4.4).
    #[inline]
    pub fn add_to_cell_next(&mut self, i: usize, j: usize, delta: Conserved) {
        let o = self.offset(i, j);
        for k in 0..4 {
            self.q_next[o + k] += delta[k];
        }
    }

    /// Seed `Q' ← Q` at the start of the X-sweep. Must not be called again
    /// before the Y-sweep — dimensional splitting accumulates into the same
    /// buffer (`spec.md` §9).
    pub(crate) fn seed_next_from_current(&mut self) {
        self.q_next.copy_from_slice(&self.q);
    }

    /// Freeze the current contents of `Q'` into the scratch buffer, for the
    /// Y-sweep to read from while it keeps accumulating into `Q'`.
    pub(crate) fn snapshot_next_into_scratch(&mut self) {
        self.q_scratch.copy_from_slice(&self.q_next);
    }

    /// Read a cell from the frozen Y-sweep snapshot.
    #[inline]
    pub(crate) fn scratch_cell(&self, i: usize, j: usize) -> Conserved {
        let o = self.offset(i, j);
        [
            self.q_scratch[o],
            self.q_scratch[o + 1],
            self.q_scratch[o + 2],
            self.q_scratch[o + 3],
        ]
    }

    /// Commit a stable tentative step: `Q ← Q'`.
    pub(crate) fn commit(&mut self) {
        self.q.copy_from_slice(&self.q_next);
    }

    /// Fill `Q` with `ambient` everywhere. Does not touch `t`.
    pub fn initialize(&mut self, ambient: Conserved) {
        for chunk in self.q.chunks_exact_mut(4) {
            chunk.copy_from_slice(&ambient);
        }
    }

    /// The public `reset` operation (`spec.md` §4.1): `t ← 0`, then
    /// `initialize`.
    pub fn reset(&mut self, ambient: Conserved) {
        self.t = 0.0;
        self.initialize(ambient);
    }

    /// Divergence-recovery reinitialization (`spec.md` §4.4/§9): refills `Q`
    /// with `ambient` but — unlike [`GridState::reset`] — leaves `t`
    /// untouched. This is the "reset to ambient" the stability check
    /// triggers, not the external `reset` operation.
    pub fn reinitialize_to_ambient(&mut self, ambient: Conserved) {
        self.initialize(ambient);
    }

    /// Iterate all committed cells in row-major `(i, j)` order.
    pub fn iter_cells(&self) -> impl Iterator<Item = ((usize, usize), Conserved)> + '_ {
        let nx = self.nx;
        self.q.chunks_exact(4).enumerate().map(move |(idx, c)| {
            let i = idx % nx;
            let j = idx / nx;
            ((i, j), [c[0], c[1], c[2], c[3]])
        })
    }
}
