use super::builder::{total, ModelBuilder};
use super::{Domain, LinearExpr, Relation, VarId};
use crate::components::{Component, Storage, Transformer};
use crate::error::Result;

impl ModelBuilder<'_> {
    /// State-of-charge recursion over `horizon + 1` levels:
    ///
    /// ```text
    /// soc[0]   == cap_initial
    /// soc[t+1] == soc[t] * (1 - cap_loss) + eta_in * in[t] - out[t] / eta_out
    /// cap_min  <= soc[t] <= cap_max (+ invest)
    /// ```
    ///
    /// With investment the power limits grow by `c_rate * invest`.
    pub(super) fn add_storage(&mut self, component: &Component, transformer: &Transformer, storage: &Storage) -> Result<()> {
        let uid = component.uid();
        let kind = component.kind();
        let p = transformer.params();
        let charge = self.flow(&component.inputs()[0], uid);
        let discharge = self.flow(uid, &component.outputs()[0]);
        let invest = transformer
            .annuity()
            .map(|annuity| (annuity, self.invest(uid, storage.add_cap_limit)));

        let soc_upper = if invest.is_some() { None } else { Some(storage.cap_max) };
        let soc: Vec<VarId> = (0..=self.horizon)
            .map(|t| {
                self.model
                    .add_variable(format!("{uid}_soc_{t}"), storage.cap_min, soc_upper, Domain::Continuous)
            })
            .collect();
        self.model.fix_variable(soc[0], storage.cap_initial);

        for t in 0..self.horizon {
            let expr = LinearExpr::from(soc[t + 1]) - (1.0 - storage.cap_loss) * soc[t] - storage.eta_in * charge[t]
                + (1.0 / storage.eta_out) * discharge[t];
            self.model
                .add_constraint(format!("{uid}_balance_{t}"), expr, Relation::Eq, 0.0);

            let mut charge_limit = LinearExpr::constant(p.in_max.first().copied().unwrap_or(0.0));
            let mut discharge_limit = LinearExpr::constant(p.out_max.first().copied().unwrap_or(0.0));
            if let Some((_, var)) = invest {
                self.model.add_constraint(
                    format!("{uid}_cap_max_{t}"),
                    LinearExpr::from(soc[t + 1]) - var,
                    Relation::Le,
                    storage.cap_max,
                );
                charge_limit.add_term(var, storage.c_rate_in.unwrap_or(0.0));
                discharge_limit.add_term(var, storage.c_rate_out.unwrap_or(0.0));
            }
            self.limit(format!("{uid}_in_max_{t}"), charge[t], charge_limit, false);
            self.limit_output(uid, &component.outputs()[0], t, discharge[t], discharge_limit);
        }
        self.index.soc.insert(uid.to_string(), soc);

        if let Some(outages) = &p.outages {
            self.apply_outages(component, &outages.resolve(self.horizon));
        }

        let costs = &p.costs;
        let co2_price = self.co2_price();
        let mut expr = total(&discharge, costs.opex_var + co2_price * costs.co2_var);
        expr += total(&charge, p.input_costs);
        expr.add_constant(storage.cap_max * (costs.opex_fix + co2_price * costs.co2_fix));
        if let Some((annuity, var)) = invest {
            expr.add_term(var, annuity + costs.opex_fix + co2_price * (costs.co2_fix + costs.co2_cap));
        }
        self.cost(kind, expr);
        if p.output_price != 0.0 {
            self.revenue(kind, total(&discharge, p.output_price));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::components::{Component, CostParams, StorageParams, TechnologyParams, TransformerParams};
    use crate::energy_system::Simulation;
    use crate::model::{build_model, BuiltModel};
    use crate::network::{Bus, EntityGraph};
    use chrono::{TimeZone, Utc};

    fn build(params: TransformerParams, storage: StorageParams) -> BuiltModel {
        let mut graph = EntityGraph::new();
        graph.add_bus(Bus::commodity("b_el", "electricity").unwrap()).unwrap();
        graph
            .add_component(
                Component::transformer(
                    "battery",
                    vec!["b_el".into()],
                    vec!["b_el".into()],
                    params,
                    TechnologyParams::Storage(storage),
                )
                .unwrap(),
            )
            .unwrap();
        let sim = Simulation::hourly(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(), 3).unwrap();
        build_model(&graph, &sim).unwrap()
    }

    fn battery() -> StorageParams {
        StorageParams {
            cap_max: Some(100.0),
            cap_min: Some(10.0),
            eta_in: Some(0.9),
            eta_out: Some(0.8),
            cap_loss: Some(0.01),
            c_rate_in: Some(0.5),
            c_rate_out: Some(0.5),
            ..Default::default()
        }
    }

    #[test]
    fn test_soc_levels_include_initial_state() {
        let built = build(TransformerParams::default(), battery());
        let soc = &built.index.soc["battery"];
        assert_eq!(soc.len(), 4);
        let initial = built.model.variable(soc[0]);
        assert_eq!((initial.lower, initial.upper), (50.0, Some(50.0)));
        let last = built.model.variable(soc[3]);
        assert_eq!((last.lower, last.upper), (10.0, Some(100.0)));
    }

    #[test]
    fn test_soc_recursion_coefficients() {
        let built = build(TransformerParams::default(), battery());
        let c = built
            .model
            .constraints()
            .iter()
            .find(|c| c.name == "battery_balance_1")
            .unwrap();
        let coef = |name: &str| -> f64 {
            c.expr
                .terms()
                .iter()
                .filter(|(v, _)| built.model.variable(*v).name == name)
                .map(|(_, k)| k)
                .sum()
        };
        assert_eq!(coef("battery_soc_2"), 1.0);
        assert!((coef("battery_soc_1") + 0.99).abs() < 1e-12);
        assert_eq!(coef("battery_in_b_el_1"), -0.9);
        assert!((coef("battery_out_b_el_1") - 1.25).abs() < 1e-12);
    }

    #[test]
    fn test_power_limits_are_bounds() {
        let built = build(TransformerParams::default(), battery());
        let discharge = built.index.flow("battery", "b_el").unwrap();
        assert_eq!(built.model.variable(discharge[0]).upper, Some(50.0));
    }

    #[test]
    fn test_investment_relaxes_capacity() {
        let params = TransformerParams {
            invest: true,
            costs: CostParams {
                capex: Some(500.0),
                crf: Some(0.1),
                ..Default::default()
            },
            ..Default::default()
        };
        let storage = StorageParams {
            add_cap_limit: Some(40.0),
            ..battery()
        };
        let built = build(params, storage);
        let invest = built.index.invest["battery"];
        assert_eq!(built.model.variable(invest).upper, Some(40.0));
        assert!(built.model.constraints().iter().any(|c| c.name == "battery_cap_max_2"));
        assert!(built.model.constraints().iter().any(|c| c.name == "battery_in_max_0"));
        let soc = &built.index.soc["battery"];
        assert_eq!(built.model.variable(soc[1]).upper, None);
    }
}
