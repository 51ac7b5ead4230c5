//! Terminal output formatting with colors and box drawing.

use colored::Colorize;

use crate::attack::AttackReport;
use crate::statistics::{ModeComparison, TrialReport};
use crate::types::{AttackStatus, RoundVerdict};

/// Format an attack report for human-readable terminal output.
///
/// One line per round, then the recovered value and the oracle call count.
pub fn format_attack_report(report: &AttackReport) -> String {
    let mut output = String::new();

    let header = match report.status {
        AttackStatus::Success => format!(
            "{} {}",
            "\u{26A0}".yellow().bold(),
            "SECRET RECOVERED".red().bold()
        ),
        AttackStatus::Fail => format!(
            "{} {}",
            "\u{2713}".green().bold(),
            "ATTACK FAILED".green().bold()
        ),
        AttackStatus::Aborted => "ABORTED".yellow().bold().to_string(),
        AttackStatus::Idle | AttackStatus::Running => report.status.to_string(),
    };

    output.push_str(&format_box_top());
    output.push_str(&format_box_line(&header));
    output.push_str(&format_box_separator());

    for round in &report.rounds {
        let line = match round.verdict {
            Some(RoundVerdict::Leak {
                symbol,
                latency_ms,
                margin_ms,
            }) => format!(
                "Byte {:>2}: '{}' {:>7.1} ms (+{:.1} ms)",
                round.position, symbol as char, latency_ms, margin_ms
            )
            .red()
            .to_string(),
            Some(RoundVerdict::NoSignal { spread_ms, symbol }) => format!(
                "Byte {:>2}: '{}' no signal (spread {:.1} ms)",
                round.position, symbol as char, spread_ms
            )
            .green()
            .to_string(),
            None => format!("Byte {:>2}: incomplete", round.position),
        };
        output.push_str(&format_box_line(&line));
    }

    output.push_str(&format_box_separator());
    output.push_str(&format_box_line(&format!("Recovered: {}", report.recovered.bold())));
    output.push_str(&format_box_line(&format!(
        "Leaking positions: {}/{}",
        report.leaked_positions,
        report.state.confirmed.len()
    )));
    output.push_str(&format_box_line(&format!("Oracle calls: {}", report.oracle_calls)));
    output.push_str(&format_box_bottom());

    output
}

/// Format one trial batch: summary line plus a text histogram.
pub fn format_trial_report(report: &TrialReport) -> String {
    let mut output = String::new();
    let unit = report.histogram.unit.suffix();
    let s = &report.summary;

    output.push_str(&format_box_top());
    output.push_str(&format_box_line(
        &format!("{:?} comparator, {} trials", report.mode, s.count)
            .bold()
            .to_string(),
    ));
    output.push_str(&format_box_line(&format!(
        "min {:.3} / mean {:.3} / max {:.3} ms",
        s.min, s.mean, s.max
    )));
    output.push_str(&format_box_separator());

    let scale = report.histogram.max_count();
    for bucket in &report.histogram.buckets {
        let bar_len = bucket.count * BAR_WIDTH / scale;
        let line = format!(
            "{:>7.1}-{:<7.1}{} {:>4} {}",
            bucket.range_start,
            bucket.range_end,
            unit,
            bucket.count,
            "\u{2588}".repeat(bar_len).blue()
        );
        output.push_str(&format_box_line(&line));
    }
    output.push_str(&format_box_bottom());

    output
}

/// Format a side-by-side comparison of both comparator modes.
pub fn format_mode_comparison(cmp: &ModeComparison) -> String {
    let mut output = format_trial_report(&cmp.vulnerable);
    output.push_str(&format_trial_report(&cmp.secure));
    output.push_str(&format!(
        "Mean gap (vulnerable - secure): {:.3} ms\n",
        cmp.mean_gap_ms()
    ));
    output
}

// Box drawing

const BOX_WIDTH: usize = 60;
const BAR_WIDTH: usize = 24;

/// Horizontal rule between two corner glyphs.
fn rule(left: char, right: char) -> String {
    let mut line = String::with_capacity((BOX_WIDTH + 2) * 3 + 1);
    line.push(left);
    line.extend(std::iter::repeat('\u{2500}').take(BOX_WIDTH));
    line.push(right);
    line.push('\n');
    line
}

fn format_box_top() -> String {
    rule('\u{250C}', '\u{2510}')
}

fn format_box_bottom() -> String {
    rule('\u{2514}', '\u{2518}')
}

fn format_box_separator() -> String {
    rule('\u{251C}', '\u{2524}')
}

/// One boxed row, padded by visible width so colored text lines up.
fn format_box_line(content: &str) -> String {
    let pad = (BOX_WIDTH - 2).saturating_sub(visible_width(content));
    format!("\u{2502} {content}{:pad$} \u{2502}\n", "")
}

/// Character count with ANSI color sequences (`ESC [ ... m`) skipped.
fn visible_width(s: &str) -> usize {
    let mut width = 0;
    let mut in_escape = false;
    for c in s.chars() {
        match (in_escape, c) {
            (false, '\x1b') => in_escape = true,
            (false, _) => width += 1,
            (true, 'm') => in_escape = false,
            (true, _) => {}
        }
    }
    width
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attack::ReconstructionState;
    use crate::config::{ComparatorMode, TimeUnit};
    use crate::statistics::{Histogram, Summary};
    use crate::types::{AttackRound, CandidateMeasurement};

    fn leaking_report() -> AttackReport {
        let mut state = ReconstructionState::new(2);
        state.confirmed = vec![Some(b'b'), Some(b'7')];
        state.current_position = 2;
        state.status = AttackStatus::Success;
        let round = |position, symbol| AttackRound {
            position,
            candidates: vec![CandidateMeasurement {
                symbol,
                elapsed_ms: 55.0,
                is_correct_internally: true,
            }],
            verdict: Some(RoundVerdict::Leak {
                symbol,
                latency_ms: 55.0,
                margin_ms: 40.0,
            }),
        };
        AttackReport {
            status: AttackStatus::Success,
            state,
            recovered: "b7".to_string(),
            rounds: vec![round(0, b'b'), round(1, b'7')],
            leaked_positions: 2,
            oracle_calls: 33,
        }
    }

    #[test]
    fn attack_report_lists_rounds() {
        let out = format_attack_report(&leaking_report());
        assert!(out.contains("SECRET RECOVERED"));
        assert!(out.contains("Byte  1: '7'"));
        assert!(out.contains("Oracle calls: 33"));
        assert!(out.contains("2/2"));
    }

    #[test]
    fn trial_report_has_one_line_per_bucket() {
        let samples = vec![1.0, 1.0, 3.0];
        let report = TrialReport {
            mode: ComparatorMode::Vulnerable,
            histogram: Histogram::build(&samples, 5, 5.0, TimeUnit::Millis),
            summary: Summary::of(&samples),
            samples,
        };
        let out = format_trial_report(&report);
        assert!(out.contains("Vulnerable comparator, 3 trials"));
        assert_eq!(out.lines().count(), 2 + 2 + 5 + 1);
    }

    #[test]
    fn box_lines_have_equal_width() {
        let out = format_attack_report(&leaking_report());
        let widths: Vec<usize> = out.lines().map(visible_width).collect();
        assert!(widths.iter().all(|&w| w == widths[0]));
    }

    #[test]
    fn visible_width_skips_color_codes() {
        assert_eq!(visible_width("\x1b[32mgreen\x1b[0m"), 5);
        assert_eq!(visible_width("Byte  1"), 7);
    }
}
