use super::builder::{sum_at, total, ModelBuilder};
use super::{LinearExpr, Relation};
use crate::components::{Component, Sink, Source};
use crate::error::Result;
use crate::network::EntityKind;

impl ModelBuilder<'_> {
    pub(super) fn add_sink(&mut self, component: &Component, sink: &Sink) -> Result<()> {
        let uid = component.uid();
        let params = sink.params();
        let inputs = self.inputs(component);

        if let Some(val) = &params.val {
            let demand = self.profile(uid, "val", val)?;
            for (t, value) in demand.iter().enumerate() {
                match inputs.as_slice() {
                    [single] => self.model.fix_variable(single[t], *value),
                    _ => {
                        self.model
                            .add_constraint(format!("{uid}_demand_{t}"), sum_at(&inputs, t), Relation::Eq, *value);
                    }
                }
            }
        } else if let Some(in_max) = params.in_max {
            for t in 0..self.horizon {
                match inputs.as_slice() {
                    [single] => self.model.cap_variable(single[t], in_max),
                    _ => {
                        self.model
                            .add_constraint(format!("{uid}_in_max_{t}"), sum_at(&inputs, t), Relation::Le, in_max);
                    }
                }
            }
        }

        if params.opex_var != 0.0 {
            let mut expr = LinearExpr::new();
            for vars in &inputs {
                expr += total(vars, params.opex_var);
            }
            self.cost(EntityKind::Sink, expr);
        }
        Ok(())
    }

    /// Output limited to `val[t] * (out_max + invest)`, summed over all
    /// output buses. Sources without `out_max` are unlimited.
    pub(super) fn add_source(&mut self, component: &Component, source: &Source) -> Result<()> {
        let uid = component.uid();
        let params = source.params();
        let costs = &params.costs;
        let outputs = self.outputs(component);
        if let Some(val) = &params.val {
            self.profile(uid, "val", val)?;
        }

        let invest = source
            .annuity()
            .map(|annuity| (annuity, self.invest(uid, params.add_out_limit)));
        let installed = params.out_max.or(invest.map(|_| 0.0));

        if let Some(out_max) = installed {
            for t in 0..self.horizon {
                let available = source.availability(t);
                let mut capacity = LinearExpr::constant(available * out_max);
                if let Some((_, var)) = invest {
                    capacity.add_term(var, available);
                }
                match (outputs.as_slice(), params.fixed) {
                    ([single], false) => {
                        let bus = &component.outputs()[0];
                        self.limit_output(uid, bus, t, single[t], capacity);
                    }
                    (_, false) => {
                        self.model.add_constraint(
                            format!("{uid}_capacity_{t}"),
                            sum_at(&outputs, t) - capacity,
                            Relation::Le,
                            0.0,
                        );
                    }
                    (_, true) => {
                        self.model.add_constraint(
                            format!("{uid}_fixed_{t}"),
                            sum_at(&outputs, t) - capacity,
                            Relation::Eq,
                            0.0,
                        );
                    }
                }
                if params.curtail_costs != 0.0 {
                    // curtailed = capacity - output
                    let mut curtailed = LinearExpr::new();
                    curtailed.add_constant(available * out_max);
                    if let Some((_, var)) = invest {
                        curtailed.add_term(var, available);
                    }
                    curtailed -= sum_at(&outputs, t);
                    self.cost(EntityKind::Source, curtailed * params.curtail_costs);
                }
            }

            let co2_price = self.co2_price();
            let mut fixed = LinearExpr::constant(out_max * (costs.opex_fix + co2_price * costs.co2_fix));
            if let Some((annuity, var)) = invest {
                let per_unit = annuity + costs.opex_fix + co2_price * (costs.co2_fix + costs.co2_cap);
                fixed.add_term(var, per_unit);
            }
            self.cost(EntityKind::Source, fixed);
        }

        let variable = costs.opex_var + self.co2_price() * costs.co2_var;
        if variable != 0.0 {
            let mut expr = LinearExpr::new();
            for vars in &outputs {
                expr += total(vars, variable);
            }
            self.cost(EntityKind::Source, expr);
        }
        Ok(())
    }
}
