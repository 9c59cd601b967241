//! Derived column identities and enriched tables.

use std::collections::BTreeMap;
use std::fmt;

use crate::domain::{Column, ComponentRole, ExperimentTable, Order, TIME_COLUMN};
use crate::vtn::key::NormalizerKey;

/// Identity of a column appended by the synthesizer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DerivedColumn {
    /// `col-1`: the column shifted down one row.
    Lagged(String),
    /// `∆t = t - t-1`.
    DeltaT,
    /// `[c]^α`: lag-averaged power term (variable) or raw power term (constant).
    PowerTerm { component: String, order: Order },
    /// `[c]^α∆t` (variable components).
    PowerTermDt { component: String, order: Order },
    /// `∑[c]^α∆t` (variable components).
    CumulativePowerTermDt { component: String, order: Order },
    /// `t[c]^γ` (constant components).
    ScaledTime { component: String, order: Order },
    /// The pooled normalizer column.
    Normalizer(NormalizerKey),
}

impl DerivedColumn {
    pub fn power_term(component: &str, order: Order) -> Self {
        DerivedColumn::PowerTerm {
            component: component.to_string(),
            order,
        }
    }

    /// The per-component x-axis used when inspecting one component:
    /// `∑[c]^α∆t` for variable components, `t[c]^γ` for constant ones.
    pub fn component_axis(component: &str, role: ComponentRole, order: Order) -> Self {
        let component = component.to_string();
        match role {
            ComponentRole::Variable => DerivedColumn::CumulativePowerTermDt { component, order },
            ComponentRole::Constant => DerivedColumn::ScaledTime { component, order },
        }
    }

    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for DerivedColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DerivedColumn::Lagged(name) => write!(f, "{name}-1"),
            DerivedColumn::DeltaT => write!(f, "∆t"),
            DerivedColumn::PowerTerm { component, order } => write!(f, "[{component}]^{order}"),
            DerivedColumn::PowerTermDt { component, order } => write!(f, "[{component}]^{order}∆t"),
            DerivedColumn::CumulativePowerTermDt { component, order } => {
                write!(f, "∑[{component}]^{order}∆t")
            }
            DerivedColumn::ScaledTime { component, order } => write!(f, "{TIME_COLUMN}[{component}]^{order}"),
            DerivedColumn::Normalizer(key) => write!(f, "{key}"),
        }
    }
}

/// An experiment table plus the columns derived from it under one configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedTable {
    raw: ExperimentTable,
    derived: BTreeMap<DerivedColumn, Column>,
    key: NormalizerKey,
}

impl EnrichedTable {
    pub(crate) fn new(raw: ExperimentTable, key: NormalizerKey) -> Self {
        Self {
            raw,
            derived: BTreeMap::new(),
            key,
        }
    }

    /// Insert a derived column, replacing any column with the same identity.
    pub(crate) fn set(&mut self, column: DerivedColumn, values: Column) {
        self.derived.insert(column, values);
    }

    pub fn name(&self) -> &str {
        self.raw.name()
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    pub fn raw(&self) -> &ExperimentTable {
        &self.raw
    }

    pub fn derived(&self, column: &DerivedColumn) -> Option<&[Option<f64>]> {
        self.derived.get(column).map(|c| c.as_slice())
    }

    pub fn derived_columns(&self) -> impl Iterator<Item = (&DerivedColumn, &[Option<f64>])> {
        self.derived.iter().map(|(k, v)| (k, v.as_slice()))
    }

    pub fn normalizer_key(&self) -> &NormalizerKey {
        &self.key
    }

    /// Values of the normalizer column.
    pub fn normalizer(&self) -> &[Option<f64>] {
        // The synthesizer always writes the normalizer column for `self.key`.
        self.derived
            .get(&DerivedColumn::Normalizer(self.key.clone()))
            .map(|c| c.as_slice())
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_follow_notation() {
        let o = Order::new(1.0);
        assert_eq!(DerivedColumn::Lagged("A".into()).label(), "A-1");
        assert_eq!(DerivedColumn::DeltaT.label(), "∆t");
        assert_eq!(DerivedColumn::power_term("A", o).label(), "[A]^1");
        assert_eq!(
            DerivedColumn::component_axis("A", ComponentRole::Variable, Order::new(0.5)).label(),
            "∑[A]^0.5∆t"
        );
        assert_eq!(
            DerivedColumn::component_axis("cat", ComponentRole::Constant, o).label(),
            "t[cat]^1"
        );
    }
}
