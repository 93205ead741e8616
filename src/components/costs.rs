use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

/// Cost and emission parameters shared by every component.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields, default)]
pub struct CostParams {
    /// Variable operational expenditure per unit of throughput.
    pub opex_var: f64,
    /// Fixed operational expenditure per unit of installed capacity.
    #[validate(range(min = 0.0))]
    pub opex_fix: f64,
    /// Capital expenditure per unit of added capacity.
    #[validate(range(min = 0.0))]
    pub capex: Option<f64>,
    /// Economic lifetime in years.
    #[validate(range(min = 1.0))]
    pub lifetime: Option<f64>,
    /// Weighted average cost of capital.
    #[validate(range(min = 0.0, max = 1.0))]
    pub wacc: Option<f64>,
    /// Capital recovery factor. Derived from `wacc` and `lifetime` when absent.
    #[validate(range(min = 0.0))]
    pub crf: Option<f64>,
    /// Emissions per unit of throughput.
    #[validate(range(min = 0.0))]
    pub co2_var: f64,
    /// Emissions per unit of installed capacity.
    #[validate(range(min = 0.0))]
    pub co2_fix: f64,
    /// Emissions per unit of added capacity.
    #[validate(range(min = 0.0))]
    pub co2_cap: f64,
}

impl CostParams {
    /// `p(1+p)^n / ((1+p)^n - 1)`, or `1/n` for a zero interest rate.
    pub fn capital_recovery_factor(&self) -> Option<f64> {
        if let Some(crf) = self.crf {
            return Some(crf);
        }
        let (p, n) = (self.wacc?, self.lifetime?);
        if p == 0.0 {
            return Some(1.0 / n);
        }
        let q = (1.0 + p).powf(n);
        Some(p * q / (q - 1.0))
    }

    /// Annualised cost of one unit of added capacity.
    pub(crate) fn annuity(&self, uid: &str) -> Option<f64> {
        let capex = self.capex?;
        let crf = self.capital_recovery_factor()?;
        if self.crf.is_none() {
            info!(uid, crf, "derived capital recovery factor from wacc and lifetime");
        }
        Some(capex * crf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crf_from_wacc_and_lifetime() {
        let costs = CostParams {
            wacc: Some(0.07),
            lifetime: Some(20.0),
            ..Default::default()
        };
        let crf = costs.capital_recovery_factor().unwrap();
        assert!((crf - 0.094393).abs() < 1e-6, "crf = {crf}");
    }

    #[test]
    fn test_explicit_crf_wins() {
        let costs = CostParams {
            crf: Some(0.1),
            wacc: Some(0.07),
            lifetime: Some(20.0),
            ..Default::default()
        };
        assert_eq!(costs.capital_recovery_factor(), Some(0.1));
    }

    #[test]
    fn test_zero_interest_is_straight_line() {
        let costs = CostParams {
            wacc: Some(0.0),
            lifetime: Some(25.0),
            ..Default::default()
        };
        assert_eq!(costs.capital_recovery_factor(), Some(0.04));
    }

    #[test]
    fn test_annuity_requires_capex() {
        let costs = CostParams {
            crf: Some(0.1),
            ..Default::default()
        };
        assert_eq!(costs.annuity("pv"), None);
        let costs = CostParams {
            capex: Some(1000.0),
            ..costs
        };
        assert_eq!(costs.annuity("pv"), Some(100.0));
    }
}
