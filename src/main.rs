use anyhow::{Context, Result};
use open_energy_modeller::{config, scenario::Scenario, telemetry};
use config::Config;
use serde_json::json;
use telemetry::init_tracing;
use tracing::{info, warn};

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cfg = Config::load().context("loading config/default.toml")?;

    let mut scenario = Scenario::from_file(&cfg.scenario.path)
        .with_context(|| format!("reading scenario {}", cfg.scenario.path.display()))?;
    cfg.solver.apply(&mut scenario.simulation);
    if let Some(year) = cfg.scenario.year {
        scenario.year = Some(year);
    }

    let mut es = scenario.into_energy_system().context("creating energy system")?;
    info!(path = %cfg.scenario.path.display(), solver = es.simulation().solver(), "starting optimization");

    let summary = match es.optimize() {
        Ok(summary) => summary.clone(),
        Err(e) if e.is_infeasible() => {
            warn!("model is infeasible; check demands against capacities");
            return Err(e.into());
        }
        Err(e) => return Err(e).context("optimization failed"),
    };

    let buses: serde_json::Map<_, _> = es
        .graph()
        .buses()
        .iter()
        .map(|bus| (bus.uid().to_string(), json!(bus.results())))
        .collect();
    let components: serde_json::Map<_, _> = es
        .graph()
        .components()
        .iter()
        .map(|c| (c.uid().to_string(), json!(c.results())))
        .collect();
    let report = json!({
        "summary": summary,
        "buses": buses,
        "components": components,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
