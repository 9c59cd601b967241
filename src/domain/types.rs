//! Shared configuration types.
//!
//! These mirror the inputs an analyst hands to a VTN run:
//!
//! - `exp_pairs`: which components are variable vs constant, and which
//!   experiments vary each one
//! - `rxn_orders`: the reaction order per component
//! - `product_name`: the measured response column
//! - `kobs_line_format`: the regression formula
//!
//! Everything here is immutable once built. Re-deriving with a different order
//! means building a modified copy (`VtnConfig::with_order`), never mutating a
//! shared instance.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, VtnError};
use crate::models::Formula;

/// Role of a chemical component within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentRole {
    /// Reactant whose concentration changes over the run (lag-averaged).
    Variable,
    /// Catalyst/additive treated as fixed over the run (raw value used).
    Constant,
}

impl ComponentRole {
    pub fn display_name(self) -> &'static str {
        match self {
            ComponentRole::Variable => "variable",
            ComponentRole::Constant => "constant",
        }
    }
}

/// A reaction order.
///
/// Orders take part in column identity, so equality and hashing are defined on
/// the exact bit pattern. `-0.0` is folded into `0.0` on construction so the two
/// zeros name the same column.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct Order(f64);

impl Order {
    pub fn new(value: f64) -> Self {
        if value == 0.0 { Order(0.0) } else { Order(value) }
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl From<f64> for Order {
    fn from(value: f64) -> Self {
        Order::new(value)
    }
}

impl From<Order> for f64 {
    fn from(order: Order) -> Self {
        order.0
    }
}

impl PartialEq for Order {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for Order {}

impl Hash for Order {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl PartialOrd for Order {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Order {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role and experiment membership of one component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentPairing {
    #[serde(rename = "type")]
    pub role: ComponentRole,
    /// Experiments in which this component was varied.
    #[serde(default)]
    pub exps: Vec<String>,
    /// Display colors, carried through for plotting front-ends.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub colors: Vec<String>,
}

impl ComponentPairing {
    pub fn new(role: ComponentRole, exps: &[&str]) -> Self {
        Self {
            role,
            exps: exps.iter().map(|e| e.to_string()).collect(),
            colors: Vec::new(),
        }
    }
}

/// Ordered component → pairing map.
///
/// Insertion order is significant: it fixes the order of factors in the
/// normalizer expression. A component can be listed only once, which is what
/// guarantees each component has exactly one role.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExperimentPairs {
    entries: Vec<(String, ComponentPairing)>,
}

impl ExperimentPairs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, pairing: ComponentPairing) -> Result<()> {
        let name = name.into();
        if self.get(&name).is_some() {
            return Err(VtnError::configuration(format!(
                "component '{name}' is classified more than once"
            )));
        }
        self.entries.push((name, pairing));
        Ok(())
    }

    /// Builder-style `insert`.
    pub fn with(mut self, name: &str, role: ComponentRole, exps: &[&str]) -> Result<Self> {
        self.insert(name, ComponentPairing::new(role, exps))?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&ComponentPairing> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, p)| p)
    }

    pub fn require(&self, name: &str) -> Result<&ComponentPairing> {
        self.get(name).ok_or_else(|| {
            VtnError::configuration(format!(
                "component '{name}' is neither a variable nor a constant component"
            ))
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ComponentPairing)> {
        self.entries.iter().map(|(n, p)| (n.as_str(), p))
    }

    /// Components with `role`, in configured order.
    pub fn components_with_role(&self, role: ComponentRole) -> Vec<&str> {
        self.iter()
            .filter(|(_, p)| p.role == role)
            .map(|(n, _)| n)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for ExperimentPairs {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries.iter().map(|(n, p)| (n, p)))
    }
}

/// `exp_pairs` entries exactly as written, repeated components included.
///
/// Config loading reads this first so a component classified twice surfaces
/// as a configuration error rather than a parse error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PairingEntries(pub Vec<(String, ComponentPairing)>);

impl<'de> Deserialize<'de> for PairingEntries {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = PairingEntries;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of component name to {type, exps, colors}")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Self::Value, A::Error> {
                // Visiting entries directly keeps document order.
                let mut entries = Vec::new();
                while let Some(entry) = map.next_entry::<String, ComponentPairing>()? {
                    entries.push(entry);
                }
                Ok(PairingEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

impl TryFrom<PairingEntries> for ExperimentPairs {
    type Error = VtnError;

    fn try_from(entries: PairingEntries) -> Result<Self> {
        let mut pairs = ExperimentPairs::new();
        for (name, pairing) in entries.0 {
            pairs.insert(name, pairing)?;
        }
        Ok(pairs)
    }
}

impl<'de> Deserialize<'de> for ExperimentPairs {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        ExperimentPairs::try_from(PairingEntries::deserialize(deserializer)?).map_err(de::Error::custom)
    }
}

/// Component → reaction order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReactionOrders(BTreeMap<String, Order>);

impl ReactionOrders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, component: &str, order: f64) -> Self {
        self.set(component, order);
        self
    }

    pub fn set(&mut self, component: &str, order: f64) {
        self.0.insert(component.to_string(), Order::new(order));
    }

    pub fn get(&self, component: &str) -> Option<Order> {
        self.0.get(component).copied()
    }

    /// Look up an order, failing with a configuration error when absent.
    pub fn require(&self, component: &str) -> Result<Order> {
        self.get(component).ok_or_else(|| {
            VtnError::configuration(format!("no reaction order configured for component '{component}'"))
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Order)> {
        self.0.iter().map(|(n, o)| (n.as_str(), *o))
    }
}

/// A full run configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VtnConfig {
    #[serde(rename = "exp_pairs")]
    pub pairs: ExperimentPairs,
    #[serde(rename = "rxn_orders")]
    pub orders: ReactionOrders,
    #[serde(rename = "product_name")]
    pub product: String,
    #[serde(rename = "kobs_line_format", default)]
    pub formula: Formula,
}

impl VtnConfig {
    /// Build and validate a configuration with the default through-origin formula.
    pub fn new(pairs: ExperimentPairs, orders: ReactionOrders, product: impl Into<String>) -> Result<Self> {
        let config = VtnConfig {
            pairs,
            orders,
            product: product.into(),
            formula: Formula::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_formula(mut self, formula: Formula) -> Self {
        self.formula = formula;
        self
    }

    /// Copy of this configuration with one order replaced.
    pub fn with_order(&self, component: &str, order: f64) -> Self {
        let mut next = self.clone();
        next.orders.set(component, order);
        next
    }

    pub fn validate(&self) -> Result<()> {
        if self.product.trim().is_empty() {
            return Err(VtnError::configuration("product_name must not be empty"));
        }
        if self.pairs.is_empty() {
            return Err(VtnError::configuration("exp_pairs lists no components"));
        }
        for (name, _) in self.pairs.iter() {
            let order = self.orders.require(name)?;
            if !order.value().is_finite() {
                return Err(VtnError::configuration(format!(
                    "reaction order for '{name}' must be finite, got {order}"
                )));
            }
            if name == self.product {
                return Err(VtnError::configuration(format!(
                    "'{name}' cannot be both the product and a normalized component"
                )));
            }
        }
        Ok(())
    }

    pub fn variable_components(&self) -> Vec<&str> {
        self.pairs.components_with_role(ComponentRole::Variable)
    }

    pub fn constant_components(&self) -> Vec<&str> {
        self.pairs.components_with_role(ComponentRole::Constant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs() -> ExperimentPairs {
        ExperimentPairs::new()
            .with("B", ComponentRole::Variable, &["e1", "e3"])
            .unwrap()
            .with("A", ComponentRole::Variable, &["e1", "e2"])
            .unwrap()
            .with("cat", ComponentRole::Constant, &["e1", "e4"])
            .unwrap()
    }

    #[test]
    fn pairs_reject_duplicate_classification() {
        let err = pairs()
            .with("A", ComponentRole::Constant, &["e2"])
            .unwrap_err();
        assert!(matches!(err, VtnError::Configuration { .. }));
    }

    #[test]
    fn roles_keep_configured_order() {
        let p = pairs();
        assert_eq!(p.components_with_role(ComponentRole::Variable), vec!["B", "A"]);
        assert_eq!(p.components_with_role(ComponentRole::Constant), vec!["cat"]);
    }

    #[test]
    fn order_zeros_compare_equal() {
        assert_eq!(Order::new(-0.0), Order::new(0.0));
        assert_ne!(Order::new(1.0), Order::new(1.0 + f64::EPSILON));
        assert_eq!(Order::new(0.5).to_string(), "0.5");
        assert_eq!(Order::new(1.0).to_string(), "1");
    }

    #[test]
    fn config_requires_order_for_every_component() {
        let orders = ReactionOrders::new().with("A", 1.0).with("cat", 1.0);
        let err = VtnConfig::new(pairs(), orders, "P").unwrap_err();
        assert!(matches!(err, VtnError::Configuration { .. }));
        assert!(err.to_string().contains("'B'"));
    }

    #[test]
    fn with_order_leaves_the_source_untouched() {
        let orders = ReactionOrders::new().with("A", 1.0).with("B", 1.0).with("cat", 1.0);
        let base = VtnConfig::new(pairs(), orders, "P").unwrap();
        let next = base.with_order("A", 0.5);
        assert_eq!(base.orders.get("A"), Some(Order::new(1.0)));
        assert_eq!(next.orders.get("A"), Some(Order::new(0.5)));
    }

    #[test]
    fn config_json_keeps_document_order() {
        let json = r#"{
            "exp_pairs": {
                "cat": {"type": "constant", "exps": ["e1", "e4"], "colors": ["red", "blue"]},
                "B": {"type": "variable", "exps": ["e1", "e3"]},
                "A": {"type": "variable", "exps": ["e1", "e2"]}
            },
            "rxn_orders": {"A": 1, "B": 0.5, "cat": 1},
            "product_name": "P",
            "kobs_line_format": "y ~ x"
        }"#;
        let config: VtnConfig = serde_json::from_str(json).unwrap();
        config.validate().unwrap();
        let names: Vec<&str> = config.pairs.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["cat", "B", "A"]);
        assert_eq!(config.pairs.get("cat").unwrap().colors.len(), 2);
        assert_eq!(config.formula, Formula::WithIntercept);
    }

    #[test]
    fn config_json_rejects_duplicate_component() {
        let json = r#"{
            "exp_pairs": {
                "A": {"type": "variable", "exps": ["e1"]},
                "A": {"type": "constant", "exps": ["e2"]}
            },
            "rxn_orders": {"A": 1},
            "product_name": "P"
        }"#;
        assert!(serde_json::from_str::<VtnConfig>(json).is_err());

        let entries: PairingEntries = serde_json::from_str(
            r#"{"A": {"type": "variable", "exps": ["e1"]}, "A": {"type": "constant", "exps": []}}"#,
        )
        .unwrap();
        assert_eq!(entries.0.len(), 2);
        let err = ExperimentPairs::try_from(entries).unwrap_err();
        assert!(matches!(err, VtnError::Configuration { .. }));
    }
}
