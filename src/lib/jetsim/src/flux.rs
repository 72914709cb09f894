//! `RoeFluxKernel`: the pointwise Roe-averaged approximate Riemann flux
//! across a single face (`spec.md` §4.3).
//!
//! Pure, allocation-free, independent of grid location — the single
//! performance hotspot of the solver. No logging, no branching beyond the
//! degenerate-face and entropy-fix checks the algorithm itself calls for.

use crate::grid::{pressure_from_conservative, Conserved, GAMMA};

/// Roe-averaged numerical flux across a face with unit normal `(nx, ny)`,
/// from `left` to `right`. Returns the 4-tuple of conservative fluxes in
/// the global frame.
pub fn roe_flux(left: Conserved, right: Conserved, normal: (f32, f32)) -> Conserved {
    let (nx, ny) = normal;

    // Checked here, on the raw inputs, because `pressure_from_conservative`
    // floors its result — a NaN numerator would otherwise be silently
    // replaced by the floor and pass as "finite" downstream.
    if !left.iter().all(|v| v.is_finite()) || !right.iter().all(|v| v.is_finite()) {
        return [0.0; 4];
    }

    let rho_l_raw = left[0];
    let rho_r_raw = right[0];
    let rho_l = rho_l_raw.max(1e-6);
    let rho_r = rho_r_raw.max(1e-6);

    let u_raw_l = left[1] / rho_l;
    let v_raw_l = left[2] / rho_l;
    let u_raw_r = right[1] / rho_r;
    let v_raw_r = right[2] / rho_r;

    let p_l = pressure_from_conservative(left[0], left[1], left[2], left[3]);
    let p_r = pressure_from_conservative(right[0], right[1], right[2], right[3]);
    if !p_l.is_finite() || !p_r.is_finite() {
        return [0.0; 4];
    }

    let h_l = (left[3] + p_l) / rho_l;
    let h_r = (right[3] + p_r) / rho_r;

    // Rotate to the face-normal frame.
    let un_l = u_raw_l * nx + v_raw_l * ny;
    let ut_l = -u_raw_l * ny + v_raw_l * nx;
    let un_r = u_raw_r * nx + v_raw_r * ny;
    let ut_r = -u_raw_r * ny + v_raw_r * nx;

    // Roe average.
    let s_l = rho_l.sqrt();
    let s_r = rho_r.sqrt();
    let denom = s_l + s_r + 1e-9;
    let u_bar = (s_l * un_l + s_r * un_r) / denom;
    let v_bar = (s_l * ut_l + s_r * ut_r) / denom;
    let h_bar = (s_l * h_l + s_r * h_r) / denom;
    let q2_bar = u_bar * u_bar + v_bar * v_bar;
    let c2_bar = ((GAMMA - 1.0) * (h_bar - 0.5 * q2_bar)).max(50.0);
    let c_bar = c2_bar.sqrt();

    // Wave speeds, Harten entropy fix.
    let delta = 0.25 * (u_bar.abs() + c_bar);
    let fix = |lambda: f32| -> f32 {
        if lambda < delta {
            (lambda * lambda + delta * delta) / (2.0 * delta)
        } else {
            lambda
        }
    };
    let l1 = fix((u_bar - c_bar).abs());
    let l2 = fix(u_bar.abs());
    let l3 = l2;
    let l4 = fix((u_bar + c_bar).abs());

    // Wave amplitudes.
    let d_rho = rho_r - rho_l;
    let d_u = un_r - un_l;
    let d_v = ut_r - ut_l;
    let d_p = p_r - p_l;
    let rho_tilde = s_l * s_r;

    let a1 = (d_p - rho_tilde * c_bar * d_u) / (2.0 * c2_bar);
    let a2 = d_rho - d_p / c2_bar;
    let a3 = rho_tilde * d_v;
    let a4 = (d_p + rho_tilde * c_bar * d_u) / (2.0 * c2_bar);

    // Dissipation vector, rotated frame.
    let d0 = l1 * a1 + l2 * a2 + l4 * a4;
    let d1 = l1 * a1 * (u_bar - c_bar) + l2 * a2 * u_bar + l4 * a4 * (u_bar + c_bar);
    let d2 = l1 * a1 * v_bar + l2 * a2 * v_bar + l3 * a3 + l4 * a4 * v_bar;
    let d3 = l1 * a1 * (h_bar - u_bar * c_bar)
        + l2 * a2 * 0.5 * q2_bar
        + l3 * a3 * v_bar
        + l4 * a4 * (h_bar + u_bar * c_bar);

    // Physical fluxes, each side, rotated frame.
    let f_l = [
        rho_l * un_l,
        rho_l * un_l * un_l + p_l,
        rho_l * un_l * ut_l,
        rho_l * un_l * h_l,
    ];
    let f_r = [
        rho_r * un_r,
        rho_r * un_r * un_r + p_r,
        rho_r * un_r * ut_r,
        rho_r * un_r * h_r,
    ];

    let f0 = 0.5 * (f_l[0] + f_r[0]) - 0.5 * d0;
    let f1 = 0.5 * (f_l[1] + f_r[1]) - 0.5 * d1;
    let f2 = 0.5 * (f_l[2] + f_r[2]) - 0.5 * d2;
    let f3 = 0.5 * (f_l[3] + f_r[3]) - 0.5 * d3;

    // Rotate back to the global frame.
    [f0, f1 * nx - f2 * ny, f1 * ny + f2 * nx, f3]
}
