//! Single-threaded Yee update kernels.
//!
//! Both kernels sweep a slab of the x-axis, `[x_start, x_start + x_count)`,
//! so that a multi-threaded caller can partition the grid along x. The
//! voltage kernel covers the full j/k range and reads one-cell-backward
//! neighbours; on the low faces (index 0) the backward read collapses onto
//! the cell itself, which realises the Dirichlet behaviour there. The
//! current kernel stops one cell short of the high faces in y and z, and its
//! forward reads into the voltages require `x_start + x_count <= nx - 1`.
//!
//! Within one cell the three component updates only read the other field,
//! so they commute and the sweep order is not observable.

use crate::arrays::VectorField3D;
use crate::fdtd::operator::{CurrentCoefficients, VoltageCoefficients};

/// Voltage update over an x-slab: V = vv*V + vi*curl(I).
pub fn update_voltages(
    volt: &mut VectorField3D,
    curr: &VectorField3D,
    coeff: &VoltageCoefficients,
    x_start: usize,
    x_count: usize,
) {
    let dims = volt.dims();
    debug_assert!(x_start + x_count <= dims.nx);

    for i in x_start..x_start + x_count {
        let is = i.saturating_sub(1);
        for j in 0..dims.ny {
            let js = j.saturating_sub(1);
            for k in 0..dims.nz {
                let ks = k.saturating_sub(1);

                // x component
                let curl = curr.z.get(i, j, k) - curr.z.get(i, js, k) - curr.y.get(i, j, k)
                    + curr.y.get(i, j, ks);
                let value =
                    coeff.vv[0].get(i, j, k) * volt.x.get(i, j, k) + coeff.vi[0].get(i, j, k) * curl;
                volt.x.set(i, j, k, value);

                // y component
                let curl = curr.x.get(i, j, k) - curr.x.get(i, j, ks) - curr.z.get(i, j, k)
                    + curr.z.get(is, j, k);
                let value =
                    coeff.vv[1].get(i, j, k) * volt.y.get(i, j, k) + coeff.vi[1].get(i, j, k) * curl;
                volt.y.set(i, j, k, value);

                // z component
                let curl = curr.y.get(i, j, k) - curr.y.get(is, j, k) - curr.x.get(i, j, k)
                    + curr.x.get(i, js, k);
                let value =
                    coeff.vv[2].get(i, j, k) * volt.z.get(i, j, k) + coeff.vi[2].get(i, j, k) * curl;
                volt.z.set(i, j, k, value);
            }
        }
    }
}

/// Current update over an x-slab: I = ii*I + iv*curl(V).
pub fn update_currents(
    curr: &mut VectorField3D,
    volt: &VectorField3D,
    coeff: &CurrentCoefficients,
    x_start: usize,
    x_count: usize,
) {
    let dims = curr.dims();
    debug_assert!(x_start + x_count <= dims.nx - 1);

    for i in x_start..x_start + x_count {
        for j in 0..dims.ny - 1 {
            for k in 0..dims.nz - 1 {
                // x component
                let curl = volt.z.get(i, j, k) - volt.z.get(i, j + 1, k) - volt.y.get(i, j, k)
                    + volt.y.get(i, j, k + 1);
                let value =
                    coeff.ii[0].get(i, j, k) * curr.x.get(i, j, k) + coeff.iv[0].get(i, j, k) * curl;
                curr.x.set(i, j, k, value);

                // y component
                let curl = volt.x.get(i, j, k) - volt.x.get(i, j, k + 1) - volt.z.get(i, j, k)
                    + volt.z.get(i + 1, j, k);
                let value =
                    coeff.ii[1].get(i, j, k) * curr.y.get(i, j, k) + coeff.iv[1].get(i, j, k) * curl;
                curr.y.set(i, j, k, value);

                // z component
                let curl = volt.y.get(i, j, k) - volt.y.get(i + 1, j, k) - volt.x.get(i, j, k)
                    + volt.x.get(i, j + 1, k);
                let value =
                    coeff.ii[2].get(i, j, k) * curr.z.get(i, j, k) + coeff.iv[2].get(i, j, k) * curl;
                curr.z.set(i, j, k, value);
            }
        }
    }
}
