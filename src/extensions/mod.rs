//! Engine extension contract.
//!
//! Extensions hook into the update cycle at six points to modify field
//! values. One full time step runs:
//!
//! 1. `pre_voltage_updates` - before the voltage kernel
//! 2. Voltage update: V = vv*V + vi*curl(I)
//! 3. `post_voltage_updates` - after the voltage kernel
//! 4. `apply_to_voltages` - before the voltage excitation
//! 5. Voltage excitation
//! 6. `pre_current_updates` - before the current kernel
//! 7. Current update: I = ii*I + iv*curl(V)
//! 8. `post_current_updates` - after the current kernel
//! 9. `apply_to_current` - before the current excitation
//! 10. Current excitation
//!
//! # Dispatch order
//!
//! Each extension declares an integer [`priority`](EngineExtension::priority).
//! The engine sorts its extension list once, stably, by descending priority,
//! so registration order is preserved between equal priorities. Post- and
//! apply-hooks walk the list front to back (highest priority first); pre-hooks
//! walk it back to front. An absorbing boundary registered with a high
//! priority therefore sees the fields immediately before and after the kernel
//! it wraps.

use crate::arrays::VectorField3D;

/// An engine-side extension participating in the per-step update.
///
/// Every hook has a default no-op implementation, so extensions only
/// implement the hooks they need. Voltage-phase hooks receive the voltage
/// field mutably and the current field read-only; current-phase hooks the
/// reverse. `step` is the number of completed time steps.
///
/// Hooks must not resize the fields and cannot advance the step counter;
/// re-entering the engine from a hook is not possible.
pub trait EngineExtension: Send {
    /// Extension name for logging and debugging.
    fn name(&self) -> &str;

    /// Dispatch priority. Higher runs earlier for post/apply hooks and
    /// later for pre hooks.
    fn priority(&self) -> i32 {
        0
    }

    /// Called before the voltage kernel.
    fn pre_voltage_updates(
        &mut self,
        _volt: &mut VectorField3D,
        _curr: &VectorField3D,
        _step: u64,
    ) {
    }

    /// Called after the voltage kernel.
    fn post_voltage_updates(
        &mut self,
        _volt: &mut VectorField3D,
        _curr: &VectorField3D,
        _step: u64,
    ) {
    }

    /// Called after the post-voltage hooks, before the voltage excitation.
    fn apply_to_voltages(&mut self, _volt: &mut VectorField3D, _curr: &VectorField3D, _step: u64) {
    }

    /// Called before the current kernel.
    fn pre_current_updates(
        &mut self,
        _curr: &mut VectorField3D,
        _volt: &VectorField3D,
        _step: u64,
    ) {
    }

    /// Called after the current kernel.
    fn post_current_updates(
        &mut self,
        _curr: &mut VectorField3D,
        _volt: &VectorField3D,
        _step: u64,
    ) {
    }

    /// Called after the post-current hooks, before the current excitation.
    fn apply_to_current(&mut self, _curr: &mut VectorField3D, _volt: &VectorField3D, _step: u64) {}
}

/// Sort an extension list into dispatch order: descending priority,
/// registration order preserved on ties.
pub fn sort_by_priority(extensions: &mut [Box<dyn EngineExtension>]) {
    extensions.sort_by_key(|ext| std::cmp::Reverse(ext.priority()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrays::Dimensions;

    struct Tagged {
        tag: &'static str,
        priority: i32,
    }

    impl EngineExtension for Tagged {
        fn name(&self) -> &str {
            self.tag
        }

        fn priority(&self) -> i32 {
            self.priority
        }
    }

    #[test]
    fn test_sort_is_descending_and_stable() {
        let mut list: Vec<Box<dyn EngineExtension>> = vec![
            Box::new(Tagged { tag: "a", priority: 10 }),
            Box::new(Tagged { tag: "b", priority: 5 }),
            Box::new(Tagged { tag: "c", priority: 10 }),
            Box::new(Tagged { tag: "d", priority: 20 }),
        ];
        sort_by_priority(&mut list);
        let order: Vec<&str> = list.iter().map(|e| e.name()).collect();
        assert_eq!(order, ["d", "a", "c", "b"]);
    }

    #[test]
    fn test_default_hooks_are_no_ops() {
        let dims = Dimensions::new(2, 2, 2);
        let mut volt = VectorField3D::new(dims);
        let mut curr = VectorField3D::new(dims);
        let mut ext = Tagged { tag: "noop", priority: 0 };

        ext.pre_voltage_updates(&mut volt, &curr, 0);
        ext.post_voltage_updates(&mut volt, &curr, 0);
        ext.apply_to_voltages(&mut volt, &curr, 0);
        ext.pre_current_updates(&mut curr, &volt, 0);
        ext.post_current_updates(&mut curr, &volt, 0);
        ext.apply_to_current(&mut curr, &volt, 0);

        assert_eq!(volt.energy(), 0.0);
        assert_eq!(curr.energy(), 0.0);
    }
}
