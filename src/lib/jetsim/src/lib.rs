//! File: `wasm/jetsim/src/lib.rs`
//!
//! UNIT SYSTEM: SI, THROUGHOUT
//! ============================
//! Pressure: pascal (Pa)
//! Distance: meter (m)
//! Time: second (s)
//! Temperature: kelvin (K)
//! Density: kg/m³
//!
//! Conservative state per cell is `(ρ, ρu, ρv, ρE)`; see [`grid::Conserved`].

mod boundary;
mod error;
mod flux;
mod grid;
mod sweep;
mod view;

use wasm_bindgen::prelude::*;

pub use boundary::BoundaryParams;
pub use error::SolverError;
use boundary::BoundaryModel;
use grid::GridState;
use sweep::{StepOutcome, SweepIntegrator};
use view::{compute_scalar_field, ScalarMode};

/// Default chamber parameters the solver is seeded with at construction
/// (`spec.md` §6), so `step()` is valid even before a driver ever calls
/// `update_boundary`.
const DEFAULT_P_TOTAL: f64 = 350_000.0;
const DEFAULT_T_TOTAL: f64 = 1000.0;
const DEFAULT_MACH: f64 = 2.0;
const DEFAULT_P_AMBIENT: f64 = 101_325.0;

// Utility to log panics to the browser console
#[wasm_bindgen(start)]
pub fn set_panic_hook() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

#[derive(Clone, Copy, serde::Serialize, serde::Deserialize)]
struct CellView {
    rho: f32,
    rho_u: f32,
    rho_v: f32,
    rho_e: f32,
}

#[derive(Clone, serde::Serialize, serde::Deserialize)]
struct ScalarFieldView {
    nx: usize,
    ny: usize,
    values: Vec<f32>,
    min: f32,
    max: f32,
}

/// Diagnostics surfaced to the driver after each step (`spec.md` §4.7).
#[derive(Clone, Copy, serde::Serialize, serde::Deserialize)]
struct StepReport {
    t: f64,
    reset_this_step: bool,
    reset_count: u32,
}

#[wasm_bindgen]
pub struct JetSolver {
    grid: GridState,
    boundary: BoundaryModel,
    cfl: f32,
    reset_count: u32,
}

#[wasm_bindgen]
impl JetSolver {
    /// Construct a solver over an `nx` x `ny` grid, seeded with the default
    /// chamber parameters and an ambient-everywhere field.
    #[wasm_bindgen(constructor)]
    pub fn new(nx: usize, ny: usize) -> Result<JetSolver, JsValue> {
        let mut grid = GridState::new(nx, ny)?;
        let boundary = BoundaryModel::new(BoundaryParams {
            p_total: DEFAULT_P_TOTAL,
            t_total: DEFAULT_T_TOTAL,
            mach: DEFAULT_MACH,
            p_ambient: DEFAULT_P_AMBIENT,
        })?;
        grid.initialize(boundary.ambient_state().to_conserved());
        log::info!(
            "jet solver constructed: {}x{} grid, default chamber p_total={} t_total={}",
            nx,
            ny,
            DEFAULT_P_TOTAL,
            DEFAULT_T_TOTAL
        );
        Ok(JetSolver {
            grid,
            boundary,
            cfl: 0.5,
            reset_count: 0,
        })
    }

    /// Replace the chamber/ambient parameters driving the boundary (`spec.md`
    /// §6, `update_boundary`). Takes effect on the next `step`.
    #[wasm_bindgen(js_name = updateBoundary)]
    pub fn update_boundary(
        &mut self,
        p_total: f64,
        t_total: f64,
        mach: f64,
        p_ambient: f64,
    ) -> Result<(), JsValue> {
        self.boundary.update(BoundaryParams {
            p_total,
            t_total,
            mach,
            p_ambient,
        })?;
        Ok(())
    }

    /// Set the CFL number used to limit the time step. Clamped to `(0, 1]`.
    #[wasm_bindgen(js_name = setCfl)]
    pub fn set_cfl(&mut self, cfl: f32) {
        self.cfl = cfl.clamp(1e-3, 1.0);
    }

    /// Reset the field to the current ambient state and zero the clock
    /// (`spec.md` §4.1/§6, the public `reset` operation).
    pub fn reset(&mut self) {
        self.grid.reset(self.boundary.ambient_state().to_conserved());
        self.reset_count = 0;
    }

    /// Advance the simulation by one CFL-limited step.
    pub fn step(&mut self) -> JsValue {
        let outcome = SweepIntegrator::step(&mut self.grid, &self.boundary, self.cfl);
        let reset_this_step = matches!(outcome, StepOutcome::Reset);
        if reset_this_step {
            self.reset_count += 1;
        }
        let report = StepReport {
            t: self.grid.t(),
            reset_this_step,
            reset_count: self.reset_count,
        };
        serde_wasm_bindgen::to_value(&report).unwrap()
    }

    /// Compute a named scalar field over the current grid (`spec.md` §5):
    /// `density`, `pressure`, `velocity`, `temperature`, `mach`, `schlieren`.
    #[wasm_bindgen(js_name = scalarField)]
    pub fn scalar_field(&self, mode: &str) -> Result<JsValue, JsValue> {
        let mode = ScalarMode::parse(mode)?;
        let field = compute_scalar_field(&self.grid, mode);
        let view = ScalarFieldView {
            nx: field.nx,
            ny: field.ny,
            values: field.values,
            min: field.min,
            max: field.max,
        };
        Ok(serde_wasm_bindgen::to_value(&view).unwrap())
    }

    #[wasm_bindgen(js_name = getTime)]
    pub fn get_time(&self) -> f64 {
        self.grid.t()
    }

    #[wasm_bindgen(js_name = getDimensions)]
    pub fn get_dimensions(&self) -> JsValue {
        serde_wasm_bindgen::to_value(&[self.grid.nx(), self.grid.ny()]).unwrap()
    }

    /// Snapshot of the full conservative field, row-major `(i, j)`.
    #[wasm_bindgen(js_name = getGridState)]
    pub fn get_grid_state(&self) -> JsValue {
        let cells: Vec<CellView> = self
            .grid
            .iter_cells()
            .map(|(_, c)| CellView {
                rho: c[0],
                rho_u: c[1],
                rho_v: c[2],
                rho_e: c[3],
            })
            .collect();
        serde_wasm_bindgen::to_value(&cells).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructs_with_default_boundary_and_valid_field() {
        let solver = JetSolver::new(16, 16).unwrap();
        assert_eq!(solver.get_time(), 0.0);
    }

    #[test]
    fn rejects_undersized_grid() {
        assert!(JetSolver::new(2, 2).is_err());
    }

    #[test]
    fn step_advances_clock() {
        let mut solver = JetSolver::new(16, 16).unwrap();
        solver.step();
        assert!(solver.get_time() > 0.0);
    }

    #[test]
    fn reset_zeroes_clock_and_diagnostics() {
        let mut solver = JetSolver::new(12, 12).unwrap();
        for _ in 0..5 {
            solver.step();
        }
        assert!(solver.get_time() > 0.0);
        solver.reset();
        assert_eq!(solver.get_time(), 0.0);
        assert_eq!(solver.reset_count, 0);
    }

    #[test]
    fn unknown_scalar_mode_is_an_error() {
        let solver = JetSolver::new(10, 10).unwrap();
        assert!(solver.scalar_field("vorticity").is_err());
        assert!(solver.scalar_field("pressure").is_ok());
    }

    #[test]
    fn update_boundary_rejects_bad_params() {
        let mut solver = JetSolver::new(10, 10).unwrap();
        assert!(solver.update_boundary(-1.0, 1000.0, 2.0, 101_325.0).is_err());
        assert!(solver.update_boundary(350_000.0, 1000.0, 2.0, 101_325.0).is_ok());
    }
}
