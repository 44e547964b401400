//! `narada analyzer args`: show the command line a preset produces without
//! spawning anything.

use crate::bootstrap::CliContext;
use crate::error::CliError;

pub fn execute(ctx: &CliContext, preset: Option<&str>) -> Result<(), CliError> {
    let runtime = ctx.runtime();
    let id = match preset {
        Some(id) => id.to_string(),
        None => runtime.presets().last_used()?,
    };
    let config = runtime.presets().resolve(&id)?;
    let layout = runtime.layout();

    let args = config.launch_args(
        &layout.analyzer_script.to_string_lossy(),
        &layout.analyzer_model.to_string_lossy(),
        runtime.orchestrator().endpoints(),
    );

    println!("# preset {id}");
    println!("cd {}", layout.analyzer_cwd.display());
    println!("{} {}", layout.analyzer_python.display(), args.join(" "));
    Ok(())
}
