//! `narada settings ...`

use narada_core::Settings;

use crate::bootstrap::CliContext;
use crate::commands::SettingsCommand;
use crate::error::CliError;

pub fn execute(ctx: &CliContext, command: SettingsCommand) -> Result<(), CliError> {
    match command {
        SettingsCommand::Show => {
            show(ctx.runtime().settings());
            Ok(())
        }
        SettingsCommand::Set {
            license_check_interval_secs,
            license_check_timeout_secs,
            restart_settle_ms,
            stop_grace_secs,
            analyzer_source_url,
            analyzer_output_url,
            license_python,
        } => {
            let store = ctx.settings_store();
            let mut settings = store.load()?;
            replace(&mut settings.license_check_interval_secs, license_check_interval_secs);
            replace(&mut settings.license_check_timeout_secs, license_check_timeout_secs);
            replace(&mut settings.restart_settle_ms, restart_settle_ms);
            replace(&mut settings.stop_grace_secs, stop_grace_secs);
            replace(&mut settings.analyzer_source_url, analyzer_source_url);
            replace(&mut settings.analyzer_output_url, analyzer_output_url);
            replace(&mut settings.license_python, license_python);
            store.save(&settings)?;
            println!("Saved {}", store.path().display());
            Ok(())
        }
    }
}

fn replace<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

fn show(settings: &Settings) {
    let timeout = settings
        .license_check_timeout()
        .map_or_else(|| "none".to_string(), |t| format!("{}s", t.as_secs()));

    println!(
        "License check interval: {}s",
        settings.effective_license_check_interval().as_secs()
    );
    println!("License check timeout:  {timeout}");
    println!("License interpreter:    {}", settings.effective_license_python());
    println!(
        "Restart settle delay:   {}ms",
        settings.effective_restart_settle().as_millis()
    );
    println!(
        "Stop grace period:      {}s",
        settings.effective_stop_grace().as_secs()
    );
    println!("Analyzer source:        {}", settings.effective_analyzer_source_url());
    println!("Analyzer output:        {}", settings.effective_analyzer_output_url());
    println!("HLS base:               {}", settings.effective_hls_base_url());
    println!("RTSP base:              {}", settings.effective_rtsp_base_url());
    println!("RTMP base:              {}", settings.effective_rtmp_base_url());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_keeps_existing_value_when_absent() {
        let mut slot = Some(5);
        replace(&mut slot, None);
        assert_eq!(slot, Some(5));
        replace(&mut slot, Some(9));
        assert_eq!(slot, Some(9));
    }
}
