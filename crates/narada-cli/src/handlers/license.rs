//! `narada license`: one on-demand license check.

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::presentation::render_verdict;

/// Run the checker once. An invalid verdict is printed and then returned as
/// [`CliError::Unlicensed`] so scripts can branch on the exit code.
pub async fn execute(ctx: &CliContext, json: bool) -> Result<(), CliError> {
    let state = ctx.runtime().check_license().await;
    let Some(verdict) = state.verdict() else {
        return Err(CliError::Unlicensed("no check completed".to_string()));
    };

    if json {
        println!("{}", serde_json::to_string_pretty(verdict)?);
    } else {
        println!("{}", render_verdict(verdict));
        if let Some(data) = &verdict.data {
            let fields = [
                ("Customer", &data.customer_name),
                ("Model", &data.model),
                ("Expires", &data.expiry),
                ("Hardware", &data.hardware_id),
            ];
            for (label, value) in fields {
                if let Some(value) = value {
                    println!("  {label:<9} {value}");
                }
            }
        }
    }

    if verdict.valid {
        Ok(())
    } else {
        Err(CliError::Unlicensed(verdict.message.clone()))
    }
}
