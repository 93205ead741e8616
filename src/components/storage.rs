use serde::{Deserialize, Serialize};
use tracing::info;

use super::TransformerParams;
use crate::error::{ModelError, Result};
use crate::network::EntityKind;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct StorageParams {
    /// Maximal state of charge.
    pub cap_max: Option<f64>,
    /// Minimal state of charge.
    pub cap_min: Option<f64>,
    /// State of charge before the first timestep (default `cap_max * 0.5`).
    pub cap_initial: Option<f64>,
    /// Limit of additional installed capacity (investment only).
    pub add_cap_limit: Option<f64>,
    /// Charging efficiency.
    pub eta_in: Option<f64>,
    /// Discharging efficiency.
    pub eta_out: Option<f64>,
    /// Share of the state of charge lost per timestep.
    pub cap_loss: Option<f64>,
    /// Charging power per unit of capacity.
    pub c_rate_in: Option<f64>,
    /// Discharging power per unit of capacity.
    pub c_rate_out: Option<f64>,
}

/// Validated storage technology with all defaults applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Storage {
    pub cap_max: f64,
    pub cap_min: f64,
    pub cap_initial: f64,
    pub add_cap_limit: Option<f64>,
    pub eta_in: f64,
    pub eta_out: f64,
    pub cap_loss: f64,
    pub c_rate_in: Option<f64>,
    pub c_rate_out: Option<f64>,
}

impl Storage {
    /// Resolves defaults and derives missing power limits from the C-rates.
    ///
    /// `transformer.in_max` / `out_max` are filled in place when empty.
    pub(crate) fn resolve(
        uid: &str,
        params: &StorageParams,
        transformer: &mut TransformerParams,
    ) -> Result<Self> {
        let kind = EntityKind::Storage;
        let cap_max = params
            .cap_max
            .ok_or_else(|| ModelError::missing(kind, uid, "cap_max"))?;
        if !(cap_max.is_finite() && cap_max >= 0.0) {
            return Err(ModelError::invalid(kind, uid, "cap_max", "must be a non-negative number"));
        }
        let cap_min = params.cap_min.unwrap_or(0.0);
        if cap_min < 0.0 || cap_min > cap_max {
            return Err(ModelError::invalid(kind, uid, "cap_min", format!("must lie within [0, {cap_max}]")));
        }

        let cap_initial = match params.cap_initial {
            Some(initial) => initial,
            None => {
                let initial = cap_max * 0.5;
                info!(
                    uid,
                    cap_initial = initial,
                    "no initial storage capacity set, using 0.5 of max. capacity"
                );
                initial
            }
        };
        if cap_initial < cap_min || cap_initial > cap_max {
            return Err(ModelError::invalid(
                kind,
                uid,
                "cap_initial",
                format!("must lie within [{cap_min}, {cap_max}]"),
            ));
        }

        let eta_in = params.eta_in.unwrap_or(1.0);
        let eta_out = params.eta_out.unwrap_or(1.0);
        for (attribute, eta) in [("eta_in", eta_in), ("eta_out", eta_out)] {
            if !(eta > 0.0 && eta <= 1.0) {
                return Err(ModelError::invalid(kind, uid, attribute, "must lie within (0, 1]"));
            }
        }
        let cap_loss = params.cap_loss.unwrap_or(0.0);
        if !(0.0..=1.0).contains(&cap_loss) {
            return Err(ModelError::invalid(kind, uid, "cap_loss", "must lie within [0, 1]"));
        }

        if transformer.out_max.is_empty() {
            let c_rate = params.c_rate_out.ok_or(ModelError::UnderivableLimit {
                uid: uid.to_string(),
                attribute: "out_max",
                c_rate: "c_rate_out",
            })?;
            transformer.out_max = vec![c_rate * cap_max];
            info!(uid, out_max = c_rate * cap_max, "derived out_max from c_rate_out");
        }
        if transformer.in_max.is_empty() {
            let c_rate = params.c_rate_in.ok_or(ModelError::UnderivableLimit {
                uid: uid.to_string(),
                attribute: "in_max",
                c_rate: "c_rate_in",
            })?;
            transformer.in_max = vec![c_rate * cap_max];
            info!(uid, in_max = c_rate * cap_max, "derived in_max from c_rate_in");
        }

        Ok(Self {
            cap_max,
            cap_min,
            cap_initial,
            add_cap_limit: params.add_cap_limit,
            eta_in,
            eta_out,
            cap_loss,
            c_rate_in: params.c_rate_in,
            c_rate_out: params.c_rate_out,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(cap_max: f64) -> StorageParams {
        StorageParams {
            cap_max: Some(cap_max),
            c_rate_in: Some(0.25),
            c_rate_out: Some(0.5),
            ..Default::default()
        }
    }

    #[test]
    fn test_initial_charge_defaults_to_half() {
        let mut transformer = TransformerParams::default();
        let storage = Storage::resolve("battery", &params(100.0), &mut transformer).unwrap();
        assert_eq!(storage.cap_initial, 50.0);
        assert_eq!(storage.eta_in, 1.0);
        assert_eq!(storage.cap_loss, 0.0);
    }

    #[test]
    fn test_power_limits_from_c_rate() {
        let mut transformer = TransformerParams::default();
        Storage::resolve("battery", &params(100.0), &mut transformer).unwrap();
        assert_eq!(transformer.out_max, vec![50.0]);
        assert_eq!(transformer.in_max, vec![25.0]);
    }

    #[test]
    fn test_explicit_limits_are_kept() {
        let mut transformer = TransformerParams {
            out_max: vec![7.0],
            ..Default::default()
        };
        let p = StorageParams {
            c_rate_out: None,
            ..params(100.0)
        };
        Storage::resolve("battery", &p, &mut transformer).unwrap();
        assert_eq!(transformer.out_max, vec![7.0]);
    }

    #[test]
    fn test_missing_c_rate_fails() {
        let mut transformer = TransformerParams::default();
        let p = StorageParams {
            cap_max: Some(100.0),
            c_rate_in: Some(0.5),
            ..Default::default()
        };
        let err = Storage::resolve("battery", &p, &mut transformer).unwrap_err();
        assert!(matches!(err, ModelError::UnderivableLimit { attribute: "out_max", .. }));
    }

    #[test]
    fn test_missing_cap_max_fails() {
        let mut transformer = TransformerParams::default();
        let err = Storage::resolve("battery", &StorageParams::default(), &mut transformer).unwrap_err();
        assert!(matches!(err, ModelError::MissingParameter { attribute: "cap_max", .. }));
    }

    #[test]
    fn test_initial_outside_bounds_fails() {
        let mut transformer = TransformerParams::default();
        let p = StorageParams {
            cap_initial: Some(120.0),
            ..params(100.0)
        };
        assert!(Storage::resolve("battery", &p, &mut transformer).is_err());
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn derived_limits_scale_with_capacity(cap in 0.0f64..1e6, rate in 0.0f64..4.0) {
                let mut transformer = TransformerParams::default();
                let p = StorageParams {
                    cap_max: Some(cap),
                    c_rate_in: Some(rate),
                    c_rate_out: Some(rate),
                    ..Default::default()
                };
                let storage = Storage::resolve("s", &p, &mut transformer).unwrap();
                prop_assert_eq!(transformer.out_max[0], rate * cap);
                prop_assert_eq!(transformer.in_max[0], rate * cap);
                prop_assert_eq!(storage.cap_initial, cap * 0.5);
            }
        }
    }
}
