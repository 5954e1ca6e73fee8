//! Feature-engineering stage: bureau aggregation plus the master-table join.
//!
//! Loads the application and bureau tables, collapses the bureau history to
//! one row per client, left-joins it onto the application table, and
//! persists the master dataset. Runs to completion or fails as a whole; no
//! partial output is written.

use crate::config::AppConfig;
use crate::error::Result;
use crate::features::{BureauAggregator, FeatureJoiner};
use crate::table::Table;
use tracing::info;

pub fn run(config: &AppConfig) -> Result<Table> {
    info!("loading datasets");
    let application = Table::from_csv(&config.data.application_path)?;
    let bureau = Table::from_csv(&config.data.bureau_path)?;
    info!(
        application_rows = application.n_rows(),
        bureau_rows = bureau.n_rows(),
        "datasets loaded"
    );

    let aggregates = BureauAggregator::new(&config.data.client_key).aggregate(&bureau)?;
    let master = FeatureJoiner::new(&config.data.client_key).join(&application, &aggregates)?;

    master.save(&config.data.master_path)?;
    info!(
        rows = master.n_rows(),
        cols = master.n_cols(),
        path = %config.data.master_path,
        "master table persisted"
    );
    Ok(master)
}
