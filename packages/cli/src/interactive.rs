//! Interactive mode.
//!
//! Each entered point is treated as a map click against one long-lived
//! session, so the cooldown gate and overlay replacement behave as they
//! would on a real map.

use console::style;
use crime_radius_geo_models::Coordinate;
use crime_radius_map::{ClickOutcome, GeoJsonRenderer, MapConfig, Session};
use crime_radius_source::socrata::SocrataClient;
use dialoguer::Input;

use crate::output;

/// Prompts for points until the user enters nothing or `q`.
///
/// # Errors
///
/// Returns an error if the session cannot be created from `config` or the
/// terminal prompt fails.
pub async fn run(config: &MapConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = Session::new(config, SocrataClient::new(), GeoJsonRenderer::new())?;

    println!(
        "{} {} within {} ft, last {} days",
        style("Crime radius").bold(),
        session.dataset().name,
        config.radius_feet,
        config.lookback_days
    );
    println!("Enter a point as `lat,lng` (empty or `q` to quit)");
    println!();

    loop {
        let line: String = Input::new()
            .with_prompt("Point")
            .allow_empty(true)
            .interact_text()?;

        let line = line.trim();
        if line.is_empty() || line.eq_ignore_ascii_case("q") {
            break;
        }

        let center = match parse_point(line) {
            Ok(center) => center,
            Err(message) => {
                println!("{}", style(message).red());
                continue;
            }
        };

        match session.handle_click(center).await? {
            ClickOutcome::Ignored => {
                println!("{}", style("Too soon, try again in a moment").yellow());
            }
            ClickOutcome::Rendered { dropped, .. } => {
                output::print_summary(session.current_markers(), session.current_window());
                if dropped > 0 {
                    println!(
                        "{}",
                        style(format!("{dropped} rows had no incident id")).dim()
                    );
                }
            }
            ClickOutcome::Stale { .. } => {}
            ClickOutcome::Failed { error, .. } => {
                println!("{}", style(format!("Request failed: {error}")).red());
            }
        }
        println!();
    }

    Ok(())
}

/// Parses `"lat,lng"` (whitespace around either number is ignored).
fn parse_point(input: &str) -> Result<Coordinate, String> {
    let (lat, lng) = input
        .split_once(',')
        .ok_or_else(|| format!("Expected `lat,lng`, got {input:?}"))?;

    let lat: f64 = lat
        .trim()
        .parse()
        .map_err(|e| format!("Bad latitude {:?}: {e}", lat.trim()))?;
    let lng: f64 = lng
        .trim()
        .parse()
        .map_err(|e| format!("Bad longitude {:?}: {e}", lng.trim()))?;

    Coordinate::new(lat, lng).map_err(|e| e.to_string())
}
