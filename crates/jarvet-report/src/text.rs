use colored::Colorize;

use jarvet_core::pipeline::AnalysisReport;
use jarvet_core::types::{FindingCategory, Severity};

/// Format a full analysis report for terminal output.
pub fn format_report(report: &AnalysisReport) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "\n{}\n",
        "jarvet - Archive Classloading Analysis".bold()
    ));
    out.push_str(&format!("{}\n\n", "=".repeat(40)));

    out.push_str(&format!(
        "{}: {} archives analyzed",
        "Summary".bold(),
        report.archive_count,
    ));
    if !report.skipped.is_empty() {
        out.push_str(&format!(", {} skipped", report.skipped.len()));
    }
    out.push('\n');

    for skipped in &report.skipped {
        out.push_str(&format!(
            "  {} {}: {}\n",
            "skipped".yellow(),
            skipped.name,
            skipped.reason
        ));
    }

    out.push_str(&format!("\n{}\n{}\n", "Findings".bold(), "-".repeat(40)));
    for finding in &report.findings {
        let severity_str = severity_label(finding.severity);
        out.push_str(&format!(
            "  {} {}: {} total, {} suppressed\n",
            severity_str,
            finding.category,
            finding.total,
            finding.suppressed,
        ));
    }

    if !report.circular.is_empty() {
        out.push_str(&format!(
            "\n{}\n{}\n",
            "Circular dependencies".red().bold(),
            "-".repeat(40)
        ));
        for (archive, partners) in &report.circular {
            let line = format!("  {archive} <-> {}", join(partners.iter()));
            if report.is_suppressed(FindingCategory::CircularDependencies, archive) {
                out.push_str(&format!("{} {}\n", line.dimmed(), "(suppressed)".dimmed()));
            } else {
                out.push_str(&format!("{line}\n"));
            }
        }
    }

    let flagged: Vec<_> = report
        .duplicate_packages
        .clusters
        .iter()
        .filter(|(common, _)| report.duplicate_packages.cluster_archives(common).len() > 1)
        .collect();
    if !flagged.is_empty() {
        out.push_str(&format!(
            "\n{}\n{}\n",
            "Packages split across archives".yellow().bold(),
            "-".repeat(40)
        ));
        for (common, packages) in flagged {
            let archives = report.duplicate_packages.cluster_archives(common);
            let line = format!(
                "  {common}.* [{}] in {}",
                join(packages.iter()),
                join(archives.iter())
            );
            if report.is_suppressed(FindingCategory::DuplicatePackages, common) {
                out.push_str(&format!("{} {}\n", line.dimmed(), "(suppressed)".dimmed()));
            } else {
                out.push_str(&format!("{line}\n"));
            }
        }
    }

    for (title, category, problems) in [
        (
            "Platform classes packaged in the application",
            FindingCategory::PlatformClasses,
            &report.platform_classes,
        ),
        (
            "JDK/EE classes packaged in the application",
            FindingCategory::JdkEeClasses,
            &report.jdk_ee_classes,
        ),
    ] {
        if problems.is_empty() {
            continue;
        }
        out.push_str(&format!("\n{}\n{}\n", title.yellow().bold(), "-".repeat(40)));
        for problem in problems.iter() {
            let line = format!(
                "  {} [{}]",
                problem.archive,
                problem.profiles.join(", ")
            );
            if report.is_suppressed(category, &problem.archive) {
                out.push_str(&format!("{} {}\n", line.dimmed(), "(suppressed)".dimmed()));
            } else {
                out.push_str(&format!("{line}\n"));
            }
            for (profile, by_location) in &problem.origins {
                for (location, classes) in by_location {
                    out.push_str(&format!(
                        "    {profile}: {location} already ships {} class(es)\n",
                        classes.len()
                    ));
                }
            }
        }
    }

    if !report.liveness.unused.is_empty() {
        out.push_str(&format!(
            "\n{}\n{}\n",
            "Unused archives".yellow().bold(),
            "-".repeat(40)
        ));
        for archive in &report.liveness.unused {
            if report.is_suppressed(FindingCategory::UnusedArchives, archive) {
                out.push_str(&format!(
                    "  {} {}\n",
                    archive.dimmed(),
                    "(suppressed)".dimmed()
                ));
            } else {
                out.push_str(&format!("  {archive}\n"));
            }
        }
    }

    let active_unresolved: Vec<_> = report.unresolved.iter().filter(|d| !d.suppressed).collect();
    if !active_unresolved.is_empty() {
        out.push_str(&format!(
            "\n{}\n{}\n",
            "Unresolved references".yellow().bold(),
            "-".repeat(40)
        ));
        for dep in active_unresolved {
            out.push_str(&format!("  {} -> {}\n", dep.archive, dep.class));
        }
    }

    if report.findings.iter().all(|f| f.severity == Severity::Info) {
        out.push_str(&format!("\n{}\n", "No active findings!".green().bold()));
    }

    out.push('\n');
    out
}

fn severity_label(severity: Severity) -> String {
    match severity {
        Severity::Error => "ERROR".red().bold().to_string(),
        Severity::Warning => "WARN ".yellow().bold().to_string(),
        Severity::Info => "INFO ".blue().bold().to_string(),
    }
}

fn join<'a>(items: impl Iterator<Item = &'a String>) -> String {
    items.map(String::as_str).collect::<Vec<_>>().join(", ")
}

/// Format a check result for CI use. Returns (text, passed).
pub fn format_check(report: &AnalysisReport, fail_on: Severity) -> (String, bool) {
    let failing: Vec<_> = report
        .findings
        .iter()
        .filter(|f| f.severity >= fail_on)
        .collect();

    let passed = failing.is_empty();

    let mut out = format_report(report);

    if passed {
        out.push_str(&format!("{}\n", "CHECK PASSED".green().bold()));
    } else {
        out.push_str(&format!(
            "{}: {} finding categor(ies) at severity {} or above\n",
            "CHECK FAILED".red().bold(),
            failing.len(),
            fail_on,
        ));
    }

    (out, passed)
}
