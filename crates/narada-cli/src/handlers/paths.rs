//! Paths command handler.
//!
//! Displays the resolved data files and collaborator locations, for
//! diagnosing a missing relay binary or analyzer model.

use narada_core::paths::{presets_path, streams_path};

use crate::bootstrap::CliContext;

pub fn execute(ctx: &CliContext) {
    let runtime = ctx.runtime();
    let data_root = runtime.data_root();

    println!("Data root:       {}", data_root.display());
    println!("Settings:        {}", ctx.settings_store().path().display());
    println!("Presets:         {}", presets_path(data_root).display());
    println!("Streams:         {}", streams_path(data_root).display());
    println!("{}", runtime.layout());
}
