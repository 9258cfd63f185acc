//! Session reconciliation into viewer-facing view models.
//!
//! # Responsibility
//! - Derive per-participant status, panel choice and aggregate statistics
//!   from one session snapshot and an optional viewer identity.
//!
//! # Invariants
//! - Estimates of other participants stay hidden until every participant
//!   has submitted; after the reveal nothing is redacted.
//! - Aggregates exist only once every participant has submitted.
//! - Nearest-option ties resolve to the earlier option in mode order.
//! - A viewer name missing from the roster is treated as view-only.

use crate::model::estimation::{EstimateOption, EstimationMode, EstimationModeId};
use crate::model::session::{Participant, Session};

const VIEW_ONLY_LABEL: &str = "Viewing Results";
const NO_AVERAGE_DISPLAY: &str = "N/A";

/// Which main panel a viewer should see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Estimating,
    Waiting,
    Results,
}

/// Roster badge state for one participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParticipantStatus {
    Pending,
    /// Submitted, value hidden until the reveal.
    Voted,
    /// Submitted and revealed. Holds the raw option value.
    Revealed(String),
}

impl ParticipantStatus {
    /// Text shown in the roster badge.
    pub fn badge_text(&self) -> &str {
        match self {
            Self::Pending => "⏳ Pending",
            Self::Voted => "✓ Voted",
            Self::Revealed(value) => value.as_str(),
        }
    }
}

/// One roster line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantRow {
    pub name: String,
    pub status: ParticipantStatus,
}

/// Viewer's own roster entry, echoed back only to that viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerStatus {
    pub name: String,
    pub submitted: bool,
    pub own_estimate: Option<String>,
}

/// Vote count for one option.
#[derive(Debug, Clone, PartialEq)]
pub struct DistributionBucket {
    pub value: &'static str,
    pub label: &'static str,
    pub count: usize,
    /// Whether this option is the one nearest to the average.
    pub is_nearest: bool,
}

/// Revealed aggregate statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct EstimateSummary {
    /// `None` when no submitted estimate maps to a known weight.
    pub average: Option<f64>,
    pub nearest: Option<&'static EstimateOption>,
    /// Mode-specific text, e.g. `M (3.25)` or `4.0 (≈3)`.
    pub display: String,
    /// e.g. `Average Estimate (T-shirt)`.
    pub heading: String,
    /// Zero-filled, in option order.
    pub distribution: Vec<DistributionBucket>,
    /// Number of votes that contributed to the average.
    pub counted_votes: usize,
}

/// Everything a view layer needs to render one snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewModel {
    pub mode: &'static EstimationMode,
    pub task_description: String,
    /// Viewer name, or `Viewing Results` for view-only viewers.
    pub viewer_label: String,
    pub viewer: Option<ViewerStatus>,
    pub participants: Vec<ParticipantRow>,
    pub all_submitted: bool,
    pub panel: Panel,
    pub show_welcome_banner: bool,
    pub show_estimation_controls: bool,
    pub results: Option<EstimateSummary>,
}

impl ViewModel {
    pub fn title(&self) -> &'static str {
        self.mode.title
    }

    pub fn prompt(&self) -> &'static str {
        self.mode.prompt
    }

    pub fn welcome_message(&self) -> &'static str {
        self.mode.welcome_message
    }

    /// Looks up the roster status of `name`.
    pub fn status_of(&self, name: &str) -> Option<&ParticipantStatus> {
        self.participants
            .iter()
            .find(|row| row.name == name)
            .map(|row| &row.status)
    }
}

/// Reconciles one session snapshot for `viewer_name`.
///
/// `None` and names absent from the roster both produce a view-only model.
pub fn compute_view_model(session: &Session, viewer_name: Option<&str>) -> ViewModel {
    let mode = session.mode();
    let all_submitted = session.every_participant_submitted();
    let viewer = viewer_name
        .and_then(|name| session.participant(name))
        .map(|participant| ViewerStatus {
            name: participant.name.clone(),
            submitted: participant.submitted,
            own_estimate: participant.estimate.clone(),
        });

    let participants = session
        .participants
        .values()
        .map(|participant| ParticipantRow {
            name: participant.name.clone(),
            status: participant_status(participant, all_submitted),
        })
        .collect();

    let viewer_submitted = viewer.as_ref().is_some_and(|status| status.submitted);
    let panel = select_panel(all_submitted, viewer_submitted);
    let awaiting_viewer_vote = viewer.as_ref().is_some_and(|status| !status.submitted);
    let results = all_submitted.then(|| summarize(mode, session.participants.values()));

    ViewModel {
        mode,
        task_description: session.task_description.clone(),
        viewer_label: viewer
            .as_ref()
            .map_or_else(|| VIEW_ONLY_LABEL.to_string(), |status| status.name.clone()),
        viewer,
        participants,
        all_submitted,
        panel,
        show_welcome_banner: awaiting_viewer_vote,
        show_estimation_controls: awaiting_viewer_vote,
        results,
    }
}

/// Chooses the panel from the reveal state and the viewer's own submission.
pub fn select_panel(all_submitted: bool, viewer_submitted: bool) -> Panel {
    if all_submitted {
        Panel::Results
    } else if viewer_submitted {
        Panel::Waiting
    } else {
        Panel::Estimating
    }
}

fn participant_status(participant: &Participant, all_submitted: bool) -> ParticipantStatus {
    if !participant.submitted {
        return ParticipantStatus::Pending;
    }
    if !all_submitted {
        return ParticipantStatus::Voted;
    }
    ParticipantStatus::Revealed(participant.estimate.clone().unwrap_or_default())
}

/// Builds the revealed statistics for submitted participants.
pub fn summarize<'a>(
    mode: &'static EstimationMode,
    participants: impl Iterator<Item = &'a Participant> + Clone,
) -> EstimateSummary {
    let submitted_values = participants
        .filter(|participant| participant.submitted)
        .filter_map(|participant| participant.estimate.as_deref());

    let weights: Vec<f64> = submitted_values
        .clone()
        .filter_map(|value| mode.weight_of(value))
        .collect();
    let mean = average(&weights);
    let nearest = mean.and_then(|value| nearest_option(mode, value));

    let distribution = mode
        .options
        .iter()
        .map(|option| DistributionBucket {
            value: option.value,
            label: option.label,
            count: submitted_values
                .clone()
                .filter(|value| *value == option.value)
                .count(),
            is_nearest: nearest.is_some_and(|nearest| nearest.value == option.value),
        })
        .collect();

    EstimateSummary {
        average: mean,
        nearest,
        display: format_average(mode, mean, nearest),
        heading: format!("Average Estimate ({})", mode.short_label),
        distribution,
        counted_votes: weights.len(),
    }
}

/// Arithmetic mean, or `None` for no values.
pub fn average(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Option whose weight is closest to `average`; the first one wins ties.
pub fn nearest_option(
    mode: &'static EstimationMode,
    average: f64,
) -> Option<&'static EstimateOption> {
    let mut nearest: Option<(&'static EstimateOption, f64)> = None;
    for option in mode.options {
        let distance = (option.weight - average).abs();
        if nearest.map_or(true, |(_, best)| distance < best) {
            nearest = Some((option, distance));
        }
    }
    nearest.map(|(option, _)| option)
}

/// Formats the headline average for a mode.
///
/// T-shirt reads `{label} ({average:.2})`; Fibonacci reads
/// `{average:.1} (≈{label})`.
pub fn format_average(
    mode: &EstimationMode,
    average: Option<f64>,
    nearest: Option<&EstimateOption>,
) -> String {
    let Some(average) = average else {
        return NO_AVERAGE_DISPLAY.to_string();
    };

    match (mode.id, nearest) {
        (EstimationModeId::Tshirt, Some(option)) => format!("{} ({average:.2})", option.label),
        (EstimationModeId::Tshirt, None) => format!("{average:.2}"),
        (EstimationModeId::Fibonacci, Some(option)) => {
            format!("{average:.1} (≈{})", option.label)
        }
        (EstimationModeId::Fibonacci, None) => format!("{average:.1}"),
    }
}

#[cfg(test)]
mod tests {
    use super::{average, compute_view_model, nearest_option, select_panel, Panel};
    use crate::model::estimation::{EstimationModeId, FIBONACCI, TSHIRT};
    use crate::model::session::Session;
    use crate::service::mutate::{new_session, submit_estimate};

    #[test]
    fn average_of_nothing_is_none() {
        assert_eq!(average(&[]), None);
        assert_eq!(average(&[3.0, 4.0]), Some(3.5));
    }

    #[test]
    fn nearest_option_prefers_first_on_tie() {
        assert_eq!(nearest_option(&TSHIRT, 3.5).map(|o| o.value), Some("M"));
        assert_eq!(nearest_option(&FIBONACCI, 4.0).map(|o| o.value), Some("3"));
        assert_eq!(nearest_option(&FIBONACCI, 100.0).map(|o| o.value), Some("89"));
        assert_eq!(nearest_option(&TSHIRT, 0.0).map(|o| o.value), Some("XS"));
    }

    #[test]
    fn panel_rule_matches_reveal_and_viewer_state() {
        assert_eq!(select_panel(false, false), Panel::Estimating);
        assert_eq!(select_panel(false, true), Panel::Waiting);
        assert_eq!(select_panel(true, false), Panel::Results);
        assert_eq!(select_panel(true, true), Panel::Results);
    }

    #[test]
    fn empty_roster_reaches_results_with_no_average() {
        let session = Session::new("lusab-babad", "nobody", EstimationModeId::Tshirt, 0);
        let view = compute_view_model(&session, None);
        assert!(view.all_submitted);
        assert_eq!(view.panel, Panel::Results);
        let results = view.results.expect("results are computed");
        assert_eq!(results.average, None);
        assert_eq!(results.display, "N/A");
        assert!(results.distribution.iter().all(|bucket| bucket.count == 0));
    }

    #[test]
    fn foreign_values_are_dropped_from_average_and_histogram() {
        let session = new_session(
            "lusab-babad",
            "task",
            EstimationModeId::Tshirt,
            ["Alice", "Bob"],
            0,
        )
        .expect("valid roster");
        let mut session = submit_estimate(&session, "Alice", "L").expect("valid");
        if let Some(bob) = session.participants.get_mut("Bob") {
            // Written by an older client with a different scale.
            bob.estimate = Some("13".to_string());
            bob.submitted = true;
        }

        let results = compute_view_model(&session, None)
            .results
            .expect("all submitted");
        assert_eq!(results.average, Some(4.0));
        assert_eq!(results.counted_votes, 1);
        assert_eq!(results.display, "L (4.00)");
        let total: usize = results.distribution.iter().map(|bucket| bucket.count).sum();
        assert_eq!(total, 1);
    }
}
