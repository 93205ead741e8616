use super::builder::{sum_at, total, ModelBuilder};
use super::{ConstraintFamily, LinearExpr, Relation, VarId};
use crate::components::{Component, Technology, Transformer};
use crate::error::Result;

impl ModelBuilder<'_> {
    /// Conversion relations, operating limits and optional constraint
    /// families of Simple, CHP and SimpleExtractionCHP transformers.
    ///
    /// The first output is the primary one: investment, ramping, prices and
    /// variable costs refer to it.
    pub(super) fn add_transformer(&mut self, component: &Component, transformer: &Transformer) -> Result<()> {
        let uid = component.uid();
        let kind = component.kind();
        let p = transformer.params();
        let families = self.families(component)?;
        let inputs = self.inputs(component);
        let outputs = self.outputs(component);

        let invest = transformer
            .annuity()
            .map(|annuity| (annuity, self.invest(uid, p.add_out_limit)));
        let status = families.contains(&ConstraintFamily::Status).then(|| {
            let vars: Vec<VarId> = (0..self.horizon)
                .map(|t| self.model.binary(format!("{uid}_status_{t}")))
                .collect();
            self.index.status.insert(uid.to_string(), vars.clone());
            vars
        });

        for (i, vars) in inputs.iter().enumerate() {
            for t in 0..self.horizon {
                if let (Some(&in_max), None) = (p.in_max.get(i), invest) {
                    self.model.cap_variable(vars[t], in_max);
                }
                if let Some(&in_min) = p.in_min.get(i) {
                    self.lower_limit(format!("{uid}_in_min_{i}_{t}"), vars[t], in_min, status.as_ref().map(|s| s[t]));
                }
            }
        }

        for (i, vars) in outputs.iter().enumerate() {
            let bus = &component.outputs()[i];
            let primary_invest = if i == 0 { invest } else { None };
            for t in 0..self.horizon {
                if let Some(&out_max) = p.out_max.get(i) {
                    let mut capacity = LinearExpr::constant(out_max);
                    if let Some((_, var)) = primary_invest {
                        capacity.add_term(var, 1.0);
                    }
                    self.limit_output(uid, bus, t, vars[t], capacity);

                    if let Some(status) = &status {
                        let big_m = out_max + primary_invest.and(p.add_out_limit).unwrap_or(0.0);
                        self.model.add_constraint(
                            format!("{uid}_status_max_{i}_{t}"),
                            LinearExpr::from(vars[t]) - big_m * status[t],
                            Relation::Le,
                            0.0,
                        );
                    }
                }
                if let Some(&out_min) = p.out_min.get(i) {
                    self.lower_limit(format!("{uid}_out_min_{i}_{t}"), vars[t], out_min, status.as_ref().map(|s| s[t]));
                }
            }
        }

        for t in 0..self.horizon {
            let fuel = sum_at(&inputs, t);
            match transformer.technology() {
                Technology::Simple { eta } => {
                    self.model.add_constraint(
                        format!("{uid}_conversion_{t}"),
                        LinearExpr::from(outputs[0][t]) - fuel * *eta,
                        Relation::Eq,
                        0.0,
                    );
                }
                Technology::Chp { eta } => {
                    for (i, eta) in eta.iter().enumerate() {
                        self.model.add_constraint(
                            format!("{uid}_conversion_{i}_{t}"),
                            LinearExpr::from(outputs[i][t]) - fuel.clone() * *eta,
                            Relation::Eq,
                            0.0,
                        );
                    }
                }
                Technology::SimpleExtractionChp {
                    eta_el_cond,
                    beta,
                    sigma,
                } => {
                    let (power, heat) = (outputs[0][t], outputs[1][t]);
                    // fuel * eta_el_cond == P + beta * Q
                    self.model.add_constraint(
                        format!("{uid}_fuel_{t}"),
                        fuel * *eta_el_cond - power - *beta * heat,
                        Relation::Eq,
                        0.0,
                    );
                    // P >= sigma * Q
                    self.model.add_constraint(
                        format!("{uid}_backpressure_{t}"),
                        LinearExpr::from(power) - *sigma * heat,
                        Relation::Ge,
                        0.0,
                    );
                }
                Technology::Storage(_) => {}
            }
        }

        if families.contains(&ConstraintFamily::Ramping) {
            self.add_ramping(component, transformer, &outputs[0], invest.map(|(_, var)| var));
        }
        if let Some(status) = &status {
            if families.contains(&ConstraintFamily::StartStop) || families.contains(&ConstraintFamily::MinUpDown) {
                self.add_start_stop(component, transformer, status);
            }
            if families.contains(&ConstraintFamily::MinUpDown) {
                self.add_min_up_down(component, transformer, status);
            }
        }
        if let Some(outages) = &p.outages {
            self.apply_outages(component, &outages.resolve(self.horizon));
        }

        let co2_price = self.co2_price();
        let costs = &p.costs;
        let mut expr = total(&outputs[0], costs.opex_var + co2_price * costs.co2_var);
        for vars in &inputs {
            expr += total(vars, p.input_costs);
        }
        if let Some(&out_max) = p.out_max.first() {
            expr.add_constant(out_max * (costs.opex_fix + co2_price * costs.co2_fix));
        }
        if let Some((annuity, var)) = invest {
            expr.add_term(var, annuity + costs.opex_fix + co2_price * (costs.co2_fix + costs.co2_cap));
        }
        self.cost(kind, expr);
        if p.output_price != 0.0 {
            self.revenue(kind, total(&outputs[0], p.output_price));
        }
        Ok(())
    }

    /// `var >= min`, or `var >= min * status` in the milp formulation.
    fn lower_limit(&mut self, name: String, var: VarId, min: f64, status: Option<VarId>) {
        match status {
            Some(status) => {
                self.model
                    .add_constraint(name, LinearExpr::from(var) - min * status, Relation::Ge, 0.0);
            }
            None => self.model.raise_lower(var, min),
        }
    }

    /// Gradient limits relative to `out_max` of the primary output, plus
    /// ramp variables carrying `ramp_costs`.
    fn add_ramping(&mut self, component: &Component, transformer: &Transformer, out: &[VarId], invest: Option<VarId>) {
        let uid = component.uid();
        let p = transformer.params();
        let out_max = p.out_max.first().copied().unwrap_or(0.0);
        let mut ramp_vars = Vec::new();
        for t in 1..self.horizon {
            let delta = LinearExpr::from(out[t]) - out[t - 1];
            for (role, grad, sign) in [("ramp_up", p.grad_pos, 1.0), ("ramp_down", p.grad_neg, -1.0)] {
                if let Some(grad) = grad {
                    let mut expr = delta.clone() * sign;
                    if let Some(var) = invest {
                        expr.add_term(var, -grad);
                    }
                    self.model
                        .add_constraint(format!("{uid}_{role}_{t}"), expr, Relation::Le, grad * out_max);
                }
            }
            if p.ramp_costs.is_some() {
                let ramp = self.model.continuous(format!("{uid}_ramp_{t}"), None);
                self.model.add_constraint(
                    format!("{uid}_ramp_pos_{t}"),
                    LinearExpr::from(ramp) - delta.clone(),
                    Relation::Ge,
                    0.0,
                );
                self.model.add_constraint(
                    format!("{uid}_ramp_neg_{t}"),
                    LinearExpr::from(ramp) + delta,
                    Relation::Ge,
                    0.0,
                );
                ramp_vars.push(ramp);
            }
        }
        if let Some(cost) = p.ramp_costs {
            self.cost(component.kind(), total(&ramp_vars, cost));
        }
    }

    /// Start and stop indicators following status transitions. The state
    /// before the first timestep is unknown, so no transition is counted there.
    fn add_start_stop(&mut self, component: &Component, transformer: &Transformer, status: &[VarId]) {
        let uid = component.uid();
        let p = transformer.params();
        let start = self.series(uid, "start", Some(1.0));
        let stop = self.series(uid, "stop", Some(1.0));
        if let (Some(start0), Some(stop0)) = (start.first(), stop.first()) {
            self.model.fix_variable(*start0, 0.0);
            self.model.fix_variable(*stop0, 0.0);
        }
        for t in 1..self.horizon {
            let switch = LinearExpr::from(status[t]) - status[t - 1];
            self.model.add_constraint(
                format!("{uid}_startup_{t}"),
                LinearExpr::from(start[t]) - switch.clone(),
                Relation::Ge,
                0.0,
            );
            self.model.add_constraint(
                format!("{uid}_shutdown_{t}"),
                LinearExpr::from(stop[t]) + switch,
                Relation::Ge,
                0.0,
            );
        }
        let mut expr = LinearExpr::new();
        if let Some(cost) = p.start_costs {
            expr += total(&start, cost);
        }
        if let Some(cost) = p.stop_costs {
            expr += total(&stop, cost);
        }
        self.cost(component.kind(), expr);
    }

    /// A start at `t` keeps the unit on for `t_min_on` timesteps, a stop
    /// keeps it off for `t_min_off`, truncated at the horizon.
    fn add_min_up_down(&mut self, component: &Component, transformer: &Transformer, status: &[VarId]) {
        let uid = component.uid();
        let p = transformer.params();
        for t in 1..self.horizon {
            if let Some(n) = p.t_min_on {
                for k in t + 1..(t + n).min(self.horizon) {
                    // status[k] >= status[t] - status[t-1]
                    self.model.add_constraint(
                        format!("{uid}_min_up_{t}_{k}"),
                        LinearExpr::from(status[k]) - status[t] + status[t - 1],
                        Relation::Ge,
                        0.0,
                    );
                }
            }
            if let Some(n) = p.t_min_off {
                for k in t + 1..(t + n).min(self.horizon) {
                    // 1 - status[k] >= status[t-1] - status[t]
                    self.model.add_constraint(
                        format!("{uid}_min_down_{t}_{k}"),
                        LinearExpr::from(status[k]) + status[t - 1] - status[t],
                        Relation::Le,
                        1.0,
                    );
                }
            }
        }
    }
}
