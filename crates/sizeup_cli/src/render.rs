//! Plain-text rendering of view models.

use sizeup_core::{EstimateSummary, EstimationMode, Panel, ViewModel};
use std::fmt::{self, Write};

/// One line per mode: id, label and option values.
pub fn mode_line(mode: &EstimationMode) -> String {
    let values: Vec<&str> = mode.values().collect();
    format!("{:<10} {} [{}]", mode.id.as_str(), mode.label, values.join(" "))
}

/// Renders the full session view for a terminal.
pub fn view(view: &ViewModel) -> String {
    let mut out = String::new();
    // Formatting into a `String` only fails if a `Display` impl does.
    if let Err(err) = write_view(&mut out, view) {
        return format!("failed to render session view: {err}");
    }
    out.trim_end().to_string()
}

fn write_view(out: &mut String, view: &ViewModel) -> fmt::Result {
    writeln!(out, "{}", view.title())?;
    writeln!(out, "Task: {}", view.task_description)?;
    writeln!(out, "You: {}", view.viewer_label)?;
    writeln!(out)?;

    writeln!(out, "Participants:")?;
    for row in &view.participants {
        writeln!(out, "  {:<20} {}", row.name, row.status.badge_text())?;
    }
    writeln!(out)?;

    match view.panel {
        Panel::Estimating if view.show_estimation_controls => {
            let values: Vec<&str> = view.mode.values().collect();
            writeln!(out, "{}", view.welcome_message())?;
            writeln!(out, "{} {}", view.prompt(), values.join(" "))
        }
        Panel::Estimating => writeln!(out, "Estimation in progress."),
        Panel::Waiting => {
            let own = view
                .viewer
                .as_ref()
                .and_then(|viewer| viewer.own_estimate.as_deref())
                .unwrap_or("-");
            writeln!(out, "Your estimate: {own}")?;
            writeln!(out, "Waiting for other participants...")
        }
        Panel::Results => match &view.results {
            Some(results) => write_results(out, results),
            None => Ok(()),
        },
    }
}

fn write_results(out: &mut String, results: &EstimateSummary) -> fmt::Result {
    writeln!(out, "{}: {}", results.heading, results.display)?;
    for bucket in &results.distribution {
        let marker = if bucket.is_nearest { " *" } else { "" };
        writeln!(
            out,
            "  {:>4} | {}{marker}",
            bucket.label,
            "#".repeat(bucket.count)
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{mode_line, view};
    use sizeup_core::{compute_view_model, get_mode, new_session, submit_estimate, EstimationModeId};

    #[test]
    fn mode_line_lists_values_in_order() {
        assert_eq!(
            mode_line(get_mode(None)),
            "tshirt     T-shirt Sizes [XS S M L XL XXL]"
        );
    }

    #[test]
    fn results_view_shows_badges_and_histogram() {
        let session = new_session(
            "lusab-babad",
            "Login",
            EstimationModeId::Tshirt,
            ["Alice", "Bob"],
            1,
        )
        .unwrap();
        let pending = view(&compute_view_model(&session, Some("Bob")));
        assert!(pending.contains("⏳ Pending"));
        assert!(pending.contains("Select your T-shirt size estimate:"));

        let session = submit_estimate(&session, "Alice", "M").unwrap();
        let waiting = view(&compute_view_model(&session, Some("Alice")));
        assert!(waiting.contains("Your estimate: M"));
        assert!(waiting.contains("✓ Voted"));

        let session = submit_estimate(&session, "Bob", "L").unwrap();
        let done = view(&compute_view_model(&session, None));
        assert!(done.contains("You: Viewing Results"));
        assert!(done.contains("Average Estimate (T-shirt): M (3.50)"));
        assert!(done.contains("     M | # *"));
    }

    #[test]
    fn view_only_estimating_panel_hides_controls() {
        let session = new_session(
            "lusab-babad",
            "Spike",
            EstimationModeId::Fibonacci,
            ["Alice"],
            1,
        )
        .unwrap();
        let fibonacci = get_mode(Some("fibonacci"));
        let text = view(&compute_view_model(&session, None));
        assert!(text.starts_with(fibonacci.title));
        assert!(text.ends_with("Estimation in progress."));
        assert!(!text.contains(fibonacci.prompt));
    }
}
