use tracing::{info, warn};

use crate::EngineError;
use crate::registry::Registry;
use crate::store::Collection;
use crate::types::{BatchReport, Rule, SkippedRule};

/// Apply every active rule in order, as a background "apply all rules" pass.
///
/// With `skip_failed_rules` set (the default), a rule that fails is logged
/// and recorded in the report while its siblings still run.
///
/// # Errors
///
/// Only when `skip_failed_rules` is off: the first rule's failure.
pub fn apply_all<C: Collection>(
    rules: &[Rule],
    registry: &Registry<C>,
) -> Result<BatchReport, EngineError> {
    let mut report = BatchReport::default();

    for rule in rules {
        if !rule.active {
            report.inactive += 1;
            continue;
        }
        match rule.apply(registry) {
            Ok(applied) => report.applied.push(applied),
            Err(error) if registry.config().skip_failed_rules => {
                warn!(rule = rule.display_name(), %error, "skipping rule");
                report.skipped.push(SkippedRule {
                    rule: rule.display_name().to_owned(),
                    error,
                });
            }
            Err(error) => return Err(error),
        }
    }

    info!(
        applied = report.applied.len(),
        skipped = report.skipped.len(),
        inactive = report.inactive,
        "rules applied"
    );
    Ok(report)
}
