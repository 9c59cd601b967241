//! Column synthesis for a single experiment.
//!
//! For every variable component `c` with order `α` we add:
//!
//! - `c-1`: the lagged concentration
//! - `[c]^α = 0.5·(c + c-1)^α`: the trapezoid midpoint term
//! - `[c]^α∆t` and its running sum `∑[c]^α∆t`
//!
//! For every constant component with order `γ` we add `[c]^γ` and `t[c]^γ`.
//! Every table also gets `t-1` and `∆t`, and finally the normalizer column
//! `cumsum(Π [c]^order · ∆t)`.
//!
//! Components absent from the table are skipped here; whether an absence is an
//! error depends on the experiment pairing and is checked by the engine.

use tracing::debug;

use crate::domain::{Column, ComponentRole, ExperimentPairs, ExperimentTable, ReactionOrders, TIME_COLUMN};
use crate::error::Result;
use crate::math::series;
use crate::vtn::columns::{DerivedColumn, EnrichedTable};
use crate::vtn::key::build_key;

/// Derive all normalization columns for one experiment table.
pub fn synthesize(table: &ExperimentTable, pairs: &ExperimentPairs, orders: &ReactionOrders) -> Result<EnrichedTable> {
    let variable = pairs.components_with_role(ComponentRole::Variable);
    let constant = pairs.components_with_role(ComponentRole::Constant);
    let key = build_key(&variable, &constant, orders)?;

    let t = table.time()?;
    let t_lag = series::lag(t, 1);
    let dt = series::sub(t, &t_lag);

    let mut out = EnrichedTable::new(table.clone(), key.clone());
    let mut factors: Vec<Column> = Vec::with_capacity(variable.len() + constant.len() + 1);
    let mut skipped = Vec::new();

    for component in variable {
        let order = orders.require(component)?;
        let Some(values) = table.column(component) else {
            skipped.push(component);
            continue;
        };
        let alpha = order.value();

        let lagged = series::lag(values, 1);
        let term = series::zip_with(values, &lagged, |c, c_lag| 0.5 * (c + c_lag).powf(alpha));
        let term_dt = series::mul(&term, &dt);
        let cumulative = series::cumulative_sum(&term_dt);

        factors.push(term.clone());
        out.set(DerivedColumn::Lagged(component.to_string()), lagged);
        out.set(DerivedColumn::power_term(component, order), term);
        out.set(
            DerivedColumn::PowerTermDt {
                component: component.to_string(),
                order,
            },
            term_dt,
        );
        out.set(
            DerivedColumn::CumulativePowerTermDt {
                component: component.to_string(),
                order,
            },
            cumulative,
        );
    }

    for component in constant {
        let order = orders.require(component)?;
        let Some(values) = table.column(component) else {
            skipped.push(component);
            continue;
        };
        let gamma = order.value();

        let term = series::map(values, |c| c.powf(gamma));
        let scaled_time = series::mul(t, &term);

        factors.push(term.clone());
        out.set(DerivedColumn::power_term(component, order), term);
        out.set(
            DerivedColumn::ScaledTime {
                component: component.to_string(),
                order,
            },
            scaled_time,
        );
    }

    let product = {
        let mut refs: Vec<&[Option<f64>]> = factors.iter().map(|c| c.as_slice()).collect();
        refs.push(&dt);
        series::strict_row_product(&refs, table.len())
    };
    out.set(DerivedColumn::Normalizer(key), series::cumulative_sum(&product));
    out.set(DerivedColumn::Lagged(TIME_COLUMN.to_string()), t_lag);
    out.set(DerivedColumn::DeltaT, dt);

    debug!(
        experiment = table.name(),
        rows = table.len(),
        skipped = ?skipped,
        "synthesized normalization columns"
    );
    Ok(out)
}
