//! `BoundaryModel`: isentropic inlet/ambient state and the boundary imprint
//! (`spec.md` §4.2).

use crate::error::SolverError;
use crate::grid::{energy_from_primitive, pressure_from_conservative, Conserved, GridState};

const GAMMA: f64 = 1.4;
const R_SPECIFIC: f64 = 287.05;
const AMBIENT_TEMPERATURE: f64 = 300.0;

/// User-facing chamber parameters driving the boundary states.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundaryParams {
    pub p_total: f64,
    pub t_total: f64,
    pub mach: f64,
    pub p_ambient: f64,
}

impl BoundaryParams {
    fn validate(&self) -> Result<(), SolverError> {
        let bad = |reason: &str| SolverError::InvalidBoundaryParams {
            reason: reason.to_string(),
        };
        if !(self.p_total.is_finite() && self.p_total > 0.0) {
            return Err(bad("p_total must be positive and finite"));
        }
        if !(self.t_total.is_finite() && self.t_total > 0.0) {
            return Err(bad("t_total must be positive and finite"));
        }
        if !(self.p_ambient.is_finite() && self.p_ambient > 0.0) {
            return Err(bad("p_ambient must be positive and finite"));
        }
        if !(self.mach.is_finite() && self.mach >= 0.0) {
            return Err(bad("mach must be non-negative and finite"));
        }
        Ok(())
    }
}

/// A cached boundary primitive tuple `(ρ, u, v, p, E)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrimitiveState {
    pub rho: f32,
    pub u: f32,
    pub v: f32,
    pub p: f32,
    pub e: f32,
}

impl PrimitiveState {
    pub fn to_conserved(self) -> Conserved {
        [self.rho, self.rho * self.u, self.rho * self.v, self.e]
    }
}

fn isentropic_inlet(p_total: f64, t_total: f64, mach: f64) -> PrimitiveState {
    let factor = 1.0 + 0.2 * mach * mach;
    let t_static = t_total / factor;
    let p_static = p_total / factor.powf(GAMMA / (GAMMA - 1.0));
    let rho_static = p_static / (R_SPECIFIC * t_static);
    let c_static = (GAMMA * R_SPECIFIC * t_static).sqrt();
    let u_static = mach * c_static;

    let rho = rho_static as f32;
    let u = u_static as f32;
    let p = p_static as f32;
    PrimitiveState {
        rho,
        u,
        v: 0.0,
        p,
        e: energy_from_primitive(rho, u, 0.0, p),
    }
}

fn quiescent_ambient(p_ambient: f64) -> PrimitiveState {
    let rho_static = p_ambient / (R_SPECIFIC * AMBIENT_TEMPERATURE);
    let rho = rho_static as f32;
    let p = p_ambient as f32;
    PrimitiveState {
        rho,
        u: 0.0,
        v: 0.0,
        p,
        e: energy_from_primitive(rho, 0.0, 0.0, p),
    }
}

/// Translates chamber parameters into cached inlet/ambient states and
/// imprints fixed boundary conditions onto `Q'` each step.
pub struct BoundaryModel {
    params: BoundaryParams,
    inlet: PrimitiveState,
    ambient: PrimitiveState,
}

impl BoundaryModel {
    pub fn new(params: BoundaryParams) -> Result<Self, SolverError> {
        params.validate()?;
        let inlet = isentropic_inlet(params.p_total, params.t_total, params.mach);
        let ambient = quiescent_ambient(params.p_ambient);
        log::debug!(
            "boundary model initialized: inlet rho={} u={} p={}, ambient rho={} p={}",
            inlet.rho,
            inlet.u,
            inlet.p,
            ambient.rho,
            ambient.p
        );
        Ok(BoundaryModel {
            params,
            inlet,
            ambient,
        })
    }

    pub fn update(&mut self, params: BoundaryParams) -> Result<(), SolverError> {
        params.validate()?;
        self.params = params;
        self.inlet = isentropic_inlet(params.p_total, params.t_total, params.mach);
        self.ambient = quiescent_ambient(params.p_ambient);
        log::debug!(
            "boundary model updated: inlet rho={} u={} p={}, ambient rho={} p={}",
            self.inlet.rho,
            self.inlet.u,
            self.inlet.p,
            self.ambient.rho,
            self.ambient.p
        );
        Ok(())
    }

    pub fn params(&self) -> BoundaryParams {
        self.params
    }

    pub fn inlet_state(&self) -> PrimitiveState {
        self.inlet
    }

    pub fn ambient_state(&self) -> PrimitiveState {
        self.ambient
    }

    /// Imprint the boundary onto `Q'`. Must run after both sweeps and
    /// before positivity repair (`spec.md` §4.2/§4.4).
    pub fn imprint(&self, grid: &mut GridState) {
        let nx = grid.nx();
        let ny = grid.ny();
        let j_c = ny / 2;
        let r = ny / 8;
        let inlet_q = self.inlet.to_conserved();
        let ambient_q = self.ambient.to_conserved();

        for j in 0..ny {
            if j.abs_diff(j_c) <= r {
                grid.set_cell_next(0, j, inlet_q);
            } else {
                // Slip wall. Faithfully replicates the source formula: the
                // energy is recomputed for a *zeroed* velocity even though
                // the y-momentum component stored is the copied (nonzero)
                // value from i=1 — see `spec.md` §9, open question (a).
                let c1 = grid.cell_next(1, j);
                let p1 = pressure_from_conservative(c1[0], c1[1], c1[2], c1[3]);
                let rho_new = c1[0];
                let rho_v_new = c1[2];
                let e_new = energy_from_primitive(rho_new, 0.0, 0.0, p1);
                grid.set_cell_next(0, j, [rho_new, 0.0, rho_v_new, e_new]);
            }
        }

        for j in 0..ny {
            let c = grid.cell_next(nx - 2, j);
            grid.set_cell_next(nx - 1, j, c);
        }

        for i in 0..nx {
            grid.set_cell_next(i, 0, ambient_q);
            grid.set_cell_next(i, ny - 1, ambient_q);
        }
    }
}
