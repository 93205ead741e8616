use super::builder::{total, ModelBuilder};
use super::{LinearExpr, Relation};
use crate::components::{Component, Transport};
use crate::error::Result;

impl ModelBuilder<'_> {
    /// `out[t] == eta * in[t - delay]`. Outputs before the first arrival are
    /// zero and inputs that would arrive after the horizon are blocked.
    pub(super) fn add_transport(&mut self, component: &Component, transport: &Transport) -> Result<()> {
        let uid = component.uid();
        let input = self.flow(&component.inputs()[0], uid);
        let output = self.flow(uid, &component.outputs()[0]);
        let delay = transport.kind().delay();

        for t in 0..self.horizon {
            if let Some(in_max) = transport.in_max() {
                self.model.cap_variable(input[t], in_max);
            }
            if let Some(out_max) = transport.out_max() {
                self.model.cap_variable(output[t], out_max);
            }
            if t < delay {
                self.model.fix_variable(output[t], 0.0);
            } else {
                self.model.add_constraint(
                    format!("{uid}_transfer_{t}"),
                    LinearExpr::from(output[t]) - transport.eta() * input[t - delay],
                    Relation::Eq,
                    0.0,
                );
            }
            if t + delay >= self.horizon {
                self.model.fix_variable(input[t], 0.0);
            }
        }

        let opex = transport.params().opex_var;
        if opex != 0.0 {
            self.cost(component.kind(), total(&input, opex));
        }
        Ok(())
    }
}
