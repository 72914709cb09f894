//! `ScalarFieldView`: derived scalar fields for rendering (`spec.md` §5).

use crate::error::SolverError;
use crate::grid::{pressure_from_conservative, GridState, GAMMA, R_SPECIFIC};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarMode {
    Density,
    Pressure,
    Velocity,
    Temperature,
    Mach,
    Schlieren,
}

impl ScalarMode {
    pub fn parse(name: &str) -> Result<Self, SolverError> {
        match name {
            "density" => Ok(ScalarMode::Density),
            "pressure" => Ok(ScalarMode::Pressure),
            "velocity" => Ok(ScalarMode::Velocity),
            "temperature" => Ok(ScalarMode::Temperature),
            "mach" => Ok(ScalarMode::Mach),
            "schlieren" => Ok(ScalarMode::Schlieren),
            other => Err(SolverError::UnknownScalarMode(other.to_string())),
        }
    }
}

/// A computed scalar field: row-major `nx * ny` values plus their observed
/// range, for client-side color mapping.
pub struct ScalarField {
    pub nx: usize,
    pub ny: usize,
    pub values: Vec<f32>,
    pub min: f32,
    pub max: f32,
}

/// Guard against division by a vanishing density when deriving velocity,
/// temperature, or Mach number from the conservative field.
const RHO_GUARD: f32 = 1e-9;

pub fn compute_scalar_field(grid: &GridState, mode: ScalarMode) -> ScalarField {
    let nx = grid.nx();
    let ny = grid.ny();
    let mut values = vec![0.0f32; nx * ny];

    match mode {
        ScalarMode::Density => {
            for j in 0..ny {
                for i in 0..nx {
                    values[j * nx + i] = grid.cell(i, j)[0];
                }
            }
        }
        ScalarMode::Pressure => {
            for j in 0..ny {
                for i in 0..nx {
                    let c = grid.cell(i, j);
                    values[j * nx + i] = pressure_from_conservative(c[0], c[1], c[2], c[3]);
                }
            }
        }
        ScalarMode::Velocity => {
            for j in 0..ny {
                for i in 0..nx {
                    let c = grid.cell(i, j);
                    let rho = c[0].max(RHO_GUARD);
                    let u = c[1] / rho;
                    let v = c[2] / rho;
                    values[j * nx + i] = (u * u + v * v).sqrt();
                }
            }
        }
        ScalarMode::Temperature => {
            for j in 0..ny {
                for i in 0..nx {
                    let c = grid.cell(i, j);
                    let rho = c[0].max(RHO_GUARD);
                    let p = pressure_from_conservative(c[0], c[1], c[2], c[3]);
                    values[j * nx + i] = p / (rho * R_SPECIFIC);
                }
            }
        }
        ScalarMode::Mach => {
            for j in 0..ny {
                for i in 0..nx {
                    let c = grid.cell(i, j);
                    let rho = c[0].max(RHO_GUARD);
                    let u = c[1] / rho;
                    let v = c[2] / rho;
                    let p = pressure_from_conservative(c[0], c[1], c[2], c[3]);
                    let sound = (GAMMA * p / rho).max(0.0).sqrt().max(1e-3);
                    values[j * nx + i] = (u * u + v * v).sqrt() / sound;
                }
            }
        }
        ScalarMode::Schlieren => {
            for j in 0..ny {
                for i in 0..nx {
                    values[j * nx + i] = schlieren_at(grid, i, j);
                }
            }
        }
    }

    let (mut min, mut max) = (f32::INFINITY, f32::NEG_INFINITY);
    for &v in &values {
        if v < min {
            min = v;
        }
        if v > max {
            max = v;
        }
    }
    if !min.is_finite() || !max.is_finite() {
        min = 0.0;
        max = 0.0;
    }

    ScalarField {
        nx,
        ny,
        values,
        min,
        max,
    }
}

/// Magnitude of the central-difference density gradient, zero on the grid
/// border (`spec.md` §5 — schlieren mode).
fn schlieren_at(grid: &GridState, i: usize, j: usize) -> f32 {
    let nx = grid.nx();
    let ny = grid.ny();
    if i == 0 || j == 0 || i + 1 >= nx || j + 1 >= ny {
        return 0.0;
    }
    let rho_xp = grid.cell(i + 1, j)[0];
    let rho_xm = grid.cell(i - 1, j)[0];
    let rho_yp = grid.cell(i, j + 1)[0];
    let rho_ym = grid.cell(i, j - 1)[0];
    let d_rho_dx = (rho_xp - rho_xm) / (2.0 * grid.dx());
    let d_rho_dy = (rho_yp - rho_ym) / (2.0 * grid.dy());
    (d_rho_dx * d_rho_dx + d_rho_dy * d_rho_dy).sqrt()
}
