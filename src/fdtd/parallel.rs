//! Rayon-parallel Yee update sweeps.
//!
//! The kernels partition the x-axis across the thread pool. Within a phase,
//! a voltage write at slab index i reads currents at i and i-1, and a
//! current write reads voltages at i and i+1; since the written field is
//! never read across cells inside its own phase, every x-slice can be
//! updated independently and the neighbour reads only see the other field's
//! previous sub-step.

use rayon::prelude::*;

use crate::arrays::VectorField3D;
use crate::fdtd::operator::{CurrentCoefficients, VoltageCoefficients};

/// Wrapper for a raw const pointer so it can cross thread boundaries.
///
/// # Safety
/// The caller must ensure concurrent accesses are either read-only or hit
/// non-overlapping regions.
#[derive(Copy, Clone)]
struct SendPtr<T>(*const T);

unsafe impl<T> Send for SendPtr<T> {}
unsafe impl<T> Sync for SendPtr<T> {}

impl<T> SendPtr<T> {
    #[inline]
    fn new(ptr: *const T) -> Self {
        Self(ptr)
    }

    #[inline]
    unsafe fn add(&self, offset: usize) -> *const T {
        self.0.add(offset)
    }
}

/// Mutable version of [`SendPtr`].
#[derive(Copy, Clone)]
struct SendPtrMut<T>(*mut T);

unsafe impl<T> Send for SendPtrMut<T> {}
unsafe impl<T> Sync for SendPtrMut<T> {}

impl<T> SendPtrMut<T> {
    #[inline]
    fn new(ptr: *mut T) -> Self {
        Self(ptr)
    }

    #[inline]
    unsafe fn add(&self, offset: usize) -> *mut T {
        self.0.add(offset)
    }
}

/// Parallel voltage update over an x-slab: V = vv*V + vi*curl(I).
///
/// Numerically identical to [`crate::fdtd::kernels::update_voltages`].
pub fn update_voltages(
    volt: &mut VectorField3D,
    curr: &VectorField3D,
    coeff: &VoltageCoefficients,
    x_start: usize,
    x_count: usize,
) {
    let dims = volt.dims();
    debug_assert!(x_start + x_count <= dims.nx);

    let vx = SendPtrMut::new(volt.x.as_mut_ptr());
    let vy = SendPtrMut::new(volt.y.as_mut_ptr());
    let vz = SendPtrMut::new(volt.z.as_mut_ptr());

    let cx = SendPtr::new(curr.x.as_ptr());
    let cy = SendPtr::new(curr.y.as_ptr());
    let cz = SendPtr::new(curr.z.as_ptr());

    let vv0 = SendPtr::new(coeff.vv[0].as_ptr());
    let vv1 = SendPtr::new(coeff.vv[1].as_ptr());
    let vv2 = SendPtr::new(coeff.vv[2].as_ptr());
    let vi0 = SendPtr::new(coeff.vi[0].as_ptr());
    let vi1 = SendPtr::new(coeff.vi[1].as_ptr());
    let vi2 = SendPtr::new(coeff.vi[2].as_ptr());

    (x_start..x_start + x_count).into_par_iter().for_each(|i| {
        let is = i.saturating_sub(1);
        for j in 0..dims.ny {
            let js = j.saturating_sub(1);
            for k in 0..dims.nz {
                let ks = k.saturating_sub(1);
                let idx = dims.to_linear(i, j, k);

                unsafe {
                    let curl = *cz.add(idx) - *cz.add(dims.to_linear(i, js, k)) - *cy.add(idx)
                        + *cy.add(dims.to_linear(i, j, ks));
                    *vx.add(idx) = *vv0.add(idx) * *vx.add(idx) + *vi0.add(idx) * curl;

                    let curl = *cx.add(idx) - *cx.add(dims.to_linear(i, j, ks)) - *cz.add(idx)
                        + *cz.add(dims.to_linear(is, j, k));
                    *vy.add(idx) = *vv1.add(idx) * *vy.add(idx) + *vi1.add(idx) * curl;

                    let curl = *cy.add(idx) - *cy.add(dims.to_linear(is, j, k)) - *cx.add(idx)
                        + *cx.add(dims.to_linear(i, js, k));
                    *vz.add(idx) = *vv2.add(idx) * *vz.add(idx) + *vi2.add(idx) * curl;
                }
            }
        }
    });
}

/// Parallel current update over an x-slab: I = ii*I + iv*curl(V).
///
/// Numerically identical to [`crate::fdtd::kernels::update_currents`].
pub fn update_currents(
    curr: &mut VectorField3D,
    volt: &VectorField3D,
    coeff: &CurrentCoefficients,
    x_start: usize,
    x_count: usize,
) {
    let dims = curr.dims();
    debug_assert!(x_start + x_count <= dims.nx - 1);

    let cx = SendPtrMut::new(curr.x.as_mut_ptr());
    let cy = SendPtrMut::new(curr.y.as_mut_ptr());
    let cz = SendPtrMut::new(curr.z.as_mut_ptr());

    let vx = SendPtr::new(volt.x.as_ptr());
    let vy = SendPtr::new(volt.y.as_ptr());
    let vz = SendPtr::new(volt.z.as_ptr());

    let ii0 = SendPtr::new(coeff.ii[0].as_ptr());
    let ii1 = SendPtr::new(coeff.ii[1].as_ptr());
    let ii2 = SendPtr::new(coeff.ii[2].as_ptr());
    let iv0 = SendPtr::new(coeff.iv[0].as_ptr());
    let iv1 = SendPtr::new(coeff.iv[1].as_ptr());
    let iv2 = SendPtr::new(coeff.iv[2].as_ptr());

    (x_start..x_start + x_count).into_par_iter().for_each(|i| {
        for j in 0..dims.ny - 1 {
            for k in 0..dims.nz - 1 {
                let idx = dims.to_linear(i, j, k);

                unsafe {
                    let curl = *vz.add(idx) - *vz.add(dims.to_linear(i, j + 1, k)) - *vy.add(idx)
                        + *vy.add(dims.to_linear(i, j, k + 1));
                    *cx.add(idx) = *ii0.add(idx) * *cx.add(idx) + *iv0.add(idx) * curl;

                    let curl = *vx.add(idx) - *vx.add(dims.to_linear(i, j, k + 1)) - *vz.add(idx)
                        + *vz.add(dims.to_linear(i + 1, j, k));
                    *cy.add(idx) = *ii1.add(idx) * *cy.add(idx) + *iv1.add(idx) * curl;

                    let curl = *vy.add(idx) - *vy.add(dims.to_linear(i + 1, j, k)) - *vx.add(idx)
                        + *vx.add(dims.to_linear(i, j + 1, k));
                    *cz.add(idx) = *ii2.add(idx) * *cz.add(idx) + *iv2.add(idx) * curl;
                }
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrays::Dimensions;
    use crate::fdtd::kernels;

    fn patterned_fields(dims: Dimensions) -> (VectorField3D, VectorField3D) {
        let mut volt = VectorField3D::new(dims);
        let mut curr = VectorField3D::new(dims);
        for i in 0..dims.nx {
            for j in 0..dims.ny {
                for k in 0..dims.nz {
                    let v = 0.1 * (i as f32) - 0.2 * (j as f32) + 0.3 * (k as f32);
                    volt.x.set(i, j, k, v);
                    volt.y.set(i, j, k, 1.0 - v);
                    volt.z.set(i, j, k, v * v);
                    curr.x.set(i, j, k, -v);
                    curr.y.set(i, j, k, 0.5 * v);
                    curr.z.set(i, j, k, v + 1.0);
                }
            }
        }
        (volt, curr)
    }

    fn patterned_coefficients(
        dims: Dimensions,
    ) -> (VoltageCoefficients, CurrentCoefficients) {
        let mut vc = VoltageCoefficients::identity(dims);
        let mut cc = CurrentCoefficients::identity(dims);
        for d in 0..3 {
            for i in 0..dims.nx {
                for j in 0..dims.ny {
                    for k in 0..dims.nz {
                        let w = 0.01 * ((d + i + 2 * j + 3 * k) as f32);
                        vc.vv[d].set(i, j, k, 1.0 - w);
                        vc.vi[d].set(i, j, k, w);
                        cc.ii[d].set(i, j, k, 1.0 - 0.5 * w);
                        cc.iv[d].set(i, j, k, 0.5 * w);
                    }
                }
            }
        }
        (vc, cc)
    }

    #[test]
    fn test_parallel_voltage_matches_serial() {
        let dims = Dimensions::new(9, 7, 5);
        let (volt0, curr) = patterned_fields(dims);
        let (vc, _) = patterned_coefficients(dims);

        let mut serial = volt0.clone();
        kernels::update_voltages(&mut serial, &curr, &vc, 0, dims.nx);

        let mut parallel = volt0;
        update_voltages(&mut parallel, &curr, &vc, 0, dims.nx);

        assert_eq!(serial, parallel);
    }

    #[test]
    fn test_parallel_current_matches_serial() {
        let dims = Dimensions::new(9, 7, 5);
        let (volt, curr0) = patterned_fields(dims);
        let (_, cc) = patterned_coefficients(dims);

        let mut serial = curr0.clone();
        kernels::update_currents(&mut serial, &volt, &cc, 0, dims.nx - 1);

        let mut parallel = curr0;
        update_currents(&mut parallel, &volt, &cc, 0, dims.nx - 1);

        assert_eq!(serial, parallel);
    }
}
