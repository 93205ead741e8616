use super::builder::{sum_at, total, ModelBuilder};
use super::{LinearExpr, Relation, VarId};
use crate::network::{Bus, EntityKind};

impl ModelBuilder<'_> {
    /// Balance `inflow + shortage == outflow + excess` for every timestep.
    ///
    /// Unbalanced buses get no constraint; their outflows are an unlimited
    /// supply charged at the bus price.
    pub(super) fn add_bus(&mut self, bus: &Bus) {
        let uid = bus.uid();
        let params = bus.params();
        let inflows: Vec<Vec<VarId>> = bus
            .entity()
            .inputs()
            .iter()
            .map(|component| self.flow(component, uid))
            .collect();
        let outflows: Vec<Vec<VarId>> = bus
            .entity()
            .outputs()
            .iter()
            .map(|component| self.flow(uid, component))
            .collect();

        if params.price != 0.0 {
            let mut expr = LinearExpr::new();
            for vars in &outflows {
                expr += total(vars, params.price);
            }
            self.cost(EntityKind::Bus, expr);
        }

        if !params.balanced {
            return;
        }

        let excess = params.excess.map(|penalty| {
            let vars = self.series(uid, "excess", None);
            self.cost(EntityKind::Bus, total(&vars, penalty));
            self.index.excess.insert(uid.to_string(), vars.clone());
            vars
        });
        let shortage = params.shortage.map(|penalty| {
            let vars = self.series(uid, "shortage", None);
            self.cost(EntityKind::Bus, total(&vars, penalty));
            self.index.shortage.insert(uid.to_string(), vars.clone());
            vars
        });

        let balances = (0..self.horizon)
            .map(|t| {
                let mut expr = sum_at(&inflows, t) - sum_at(&outflows, t);
                if let Some(vars) = &shortage {
                    expr += vars[t];
                }
                if let Some(vars) = &excess {
                    expr -= vars[t];
                }
                self.model
                    .add_constraint(format!("{uid}_balance_{t}"), expr, Relation::Eq, 0.0)
            })
            .collect();
        self.index.balances.insert(uid.to_string(), balances);
    }
}
