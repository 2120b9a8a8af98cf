//! Terminal rendering of search results.

use console::style;
use crime_radius_geo_models::SearchWindow;
use crime_radius_incident::markers::MarkerDescriptor;
use crime_radius_source::dataset::DatasetDefinition;

/// Prints markers one block per incident, headed by the search window.
pub fn print_summary(markers: &[MarkerDescriptor], window: Option<&SearchWindow>) {
    if let Some(window) = window {
        println!(
            "{} {} incidents between {} and {}",
            style("Found").bold(),
            markers.len(),
            window.min,
            window.max
        );
    }

    for marker in markers {
        println!();
        println!("{}", style(&marker.title).cyan().bold());
        for line in marker.popup.lines().skip(1) {
            println!("  {line}");
        }
        if marker.group_count > 1 {
            println!("  {}", style(format!("{} offenses", marker.group_count)).dim());
        }
        println!("  {}", style(marker.coordinate).dim());
    }
}

/// Prints one dataset's id, name, and endpoint.
pub fn print_dataset(dataset: &DatasetDefinition) {
    println!(
        "{:<10} {} ({}, {})",
        style(&dataset.id).bold(),
        dataset.name,
        dataset.city,
        dataset.state
    );
    println!("           {}", dataset.api_url);
    if let Some(portal) = &dataset.portal_url {
        println!("           {}", style(portal).dim());
    }
}
