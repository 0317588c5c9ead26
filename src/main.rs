//! Binary entry point: resolve paths, start logging, open the store (a schema
//! failure aborts here, before the terminal is touched), and drive the Ratatui
//! event loop until the user exits.
use anyhow::Context;
use name_book::{logging, run_app, App, Config, Controller, Store, SystemShare};
use tracing::{error, info};

fn main() -> anyhow::Result<()> {
    let config = Config::discover()?;
    logging::init(&config.log_path())?;
    info!(data_dir = %config.data_dir.display(), platform = ?config.platform, "starting");

    let store = match Store::open(config.store_path()) {
        Ok(store) => store,
        Err(err) => {
            error!(error = %err, "could not prepare the names database");
            return Err(err).context("could not prepare the names database");
        }
    };

    let mut app = App::new(Controller::new(store), config.platform, Box::new(SystemShare));
    let result = run_app(&mut app);
    info!("exiting");
    result
}
