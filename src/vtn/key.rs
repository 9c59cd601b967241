//! Normalizer expression identity.
//!
//! The normalizer column is the shared x-axis every experiment is pooled on,
//! so its identity must be stable across experiments and repeated calls. It is
//! a structured value (ordered `(component, role, order)` factors) used as a map
//! key; the `∑[A]^1[cat]^1∆t` string is only its rendering.

use std::fmt;

use crate::domain::{ComponentRole, Order, ReactionOrders, VtnConfig};
use crate::error::Result;

/// One `[component]^order` factor of the normalizer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Factor {
    pub component: String,
    pub role: ComponentRole,
    pub order: Order,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizerKey {
    factors: Vec<Factor>,
}

impl NormalizerKey {
    pub fn factors(&self) -> &[Factor] {
        &self.factors
    }

    /// Display label, e.g. `∑[A]^1[B]^0.5[cat]^1∆t`.
    pub fn label(&self) -> String {
        self.to_string()
    }

    /// Factor-order-insensitive form of this key.
    ///
    /// Two configurations listing the same components with the same orders in a
    /// different order map to the same canonical key.
    pub fn canonical(&self) -> NormalizerKey {
        let mut factors = self.factors.clone();
        factors.sort();
        NormalizerKey { factors }
    }

    pub fn from_config(config: &VtnConfig) -> Result<NormalizerKey> {
        build_key(&config.variable_components(), &config.constant_components(), &config.orders)
    }
}

impl fmt::Display for NormalizerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "∑")?;
        for factor in &self.factors {
            write!(f, "[{}]^{}", factor.component, factor.order)?;
        }
        write!(f, "∆t")
    }
}

/// Build the normalizer key: variable components first, then constant
/// components, each in the order given.
///
/// Fails with a configuration error when any component lacks an order.
pub fn build_key(variable: &[&str], constant: &[&str], orders: &ReactionOrders) -> Result<NormalizerKey> {
    let roles = variable
        .iter()
        .map(|c| (*c, ComponentRole::Variable))
        .chain(constant.iter().map(|c| (*c, ComponentRole::Constant)));

    let mut factors = Vec::with_capacity(variable.len() + constant.len());
    for (component, role) in roles {
        factors.push(Factor {
            component: component.to_string(),
            role,
            order: orders.require(component)?,
        });
    }
    Ok(NormalizerKey { factors })
}
